/// Hex digits kept from the blake3 digest of a script.
pub const SCRIPT_HASH_LEN: usize = 16;

/// Short content hash used as the precondition for file commits.
pub fn script_hash(bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes).to_hex();
    digest.as_str()[..SCRIPT_HASH_LEN].to_string()
}
