use std::fs::{self, File, OpenOptions};
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;

use crate::error::GradleditError;
use crate::hash::script_hash;

pub(super) const TEMP_MARKER: &str = ".gradledit-tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Exclusive advisory lock on a script, released on drop.
#[derive(Debug)]
pub(super) struct ScriptLock {
    _file: File,
}

/// Identity of the file behind a path, compared before the final rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FileIdentity {
    #[cfg(unix)]
    device: u64,
    #[cfg(unix)]
    inode: u64,
    length: u64,
    modified_nanos: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Snapshot {
    pub(super) identity: FileIdentity,
    pub(super) hash: String,
}

pub(super) fn lock_script(path: &Path) -> Result<ScriptLock, GradleditError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|error| GradleditError::io(path, error))?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(ScriptLock { _file: file }),
        Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
            Err(GradleditError::ResourceBusy {
                path: path.display().to_string(),
            })
        }
        Err(error) => Err(GradleditError::io(path, error)),
    }
}

fn file_identity(path: &Path) -> Result<FileIdentity, GradleditError> {
    let metadata = fs::symlink_metadata(path).map_err(|error| GradleditError::io(path, error))?;
    if metadata.file_type().is_symlink() {
        return Err(GradleditError::InvalidRequest {
            message: format!(
                "Refusing to edit '{}' through a symbolic link",
                path.display()
            ),
        });
    }

    Ok(FileIdentity {
        #[cfg(unix)]
        device: metadata.dev(),
        #[cfg(unix)]
        inode: metadata.ino(),
        length: metadata.len(),
        modified_nanos: metadata
            .modified()
            .ok()
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_nanos()),
    })
}

/// Reads the script and records what it looked like.
pub(super) fn read_snapshot(path: &Path) -> Result<(Snapshot, Vec<u8>), GradleditError> {
    let identity = file_identity(path)?;
    let bytes = fs::read(path).map_err(|error| GradleditError::io(path, error))?;
    let snapshot = Snapshot {
        identity,
        hash: script_hash(&bytes),
    };
    Ok((snapshot, bytes))
}

pub(super) fn verify_snapshot(path: &Path, expected: &Snapshot) -> Result<(), GradleditError> {
    if file_identity(path)? != expected.identity {
        return Err(GradleditError::PathChanged {
            path: path.display().to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|error| GradleditError::io(path, error))?;
    let actual_hash = script_hash(&bytes);
    if actual_hash != expected.hash {
        return Err(GradleditError::PreconditionFailed {
            expected_hash: expected.hash.clone(),
            actual_hash,
        });
    }
    Ok(())
}

/// Writes `contents` to a sibling temp file and renames it over `path`,
/// re-checking `expected` right before the rename.
pub(super) fn replace_atomically(
    path: &Path,
    contents: &str,
    expected: &Snapshot,
) -> Result<(), GradleditError> {
    let permissions = fs::metadata(path)
        .map_err(|error| GradleditError::io(path, error))?
        .permissions();
    let (temp_path, mut temp_file) = create_sibling_temp(path)?;

    let outcome = (|| {
        temp_file
            .write_all(contents.as_bytes())
            .map_err(|error| GradleditError::io(&temp_path, error))?;
        temp_file
            .sync_all()
            .map_err(|error| GradleditError::io(&temp_path, error))?;
        fs::set_permissions(&temp_path, permissions)
            .map_err(|error| GradleditError::io(&temp_path, error))?;

        verify_snapshot(path, expected)?;
        fs::rename(&temp_path, path).map_err(|error| GradleditError::io(path, error))?;
        sync_directory_of(path)
    })();

    if outcome.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    outcome
}

fn create_sibling_temp(path: &Path) -> Result<(PathBuf, File), GradleditError> {
    let directory = directory_of(path);
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("build.gradle");

    for _ in 0..32 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = directory.join(format!(".{file_name}{TEMP_MARKER}{nanos}-{counter}"));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((temp_path, file)),
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(error) => return Err(GradleditError::io(&temp_path, error)),
        }
    }

    Err(GradleditError::InvalidRequest {
        message: format!(
            "Could not create a temporary file next to '{}'",
            path.display()
        ),
    })
}

fn directory_of(path: &Path) -> PathBuf {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn sync_directory_of(path: &Path) -> Result<(), GradleditError> {
    #[cfg(unix)]
    {
        let directory = directory_of(path);
        File::open(&directory)
            .and_then(|handle| handle.sync_all())
            .map_err(|error| GradleditError::io(&directory, error))
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
