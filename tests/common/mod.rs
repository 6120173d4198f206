#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copies a fixture into a fresh temp directory, which must outlive the path.
pub fn copy_fixture(directory: &TempDir, name: &str) -> PathBuf {
    let target = directory.path().join(name);
    fs::copy(fixture_path(name), &target).expect("fixture copy should succeed");
    target
}

pub fn write_file(directory: &TempDir, name: &str, contents: &str) -> PathBuf {
    let target = directory.path().join(name);
    fs::write(&target, contents).expect("fixture write should succeed");
    target
}

fn command(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gradledit"));
    command.env_remove("GRADLEDIT_CONFIG");
    command.env_remove("GRADLEDIT_LOG");
    command.args(args);
    command
}

pub fn run_gradledit(args: &[&str]) -> Output {
    command(args).output().expect("failed to run gradledit binary")
}

pub fn run_gradledit_with_stdin(args: &[&str], input: &str) -> Output {
    let mut command = command(args);
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().expect("failed to spawn gradledit binary");
    child
        .stdin
        .as_mut()
        .expect("stdin should be available")
        .write_all(input.as_bytes())
        .expect("stdin write should succeed");
    child
        .wait_with_output()
        .expect("failed to read process output")
}

pub fn path_arg(path: &Path) -> &str {
    path.to_str().expect("path should be utf-8")
}

pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|error| {
        panic!(
            "stdout should be valid JSON ({error}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

pub fn assert_success(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command should succeed: stdout={} stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    stdout_json(output)
}

pub fn assert_error_type(output: &Output, expected: &str) -> Value {
    assert!(
        !output.status.success(),
        "command should fail: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let response = stdout_json(output);
    assert_eq!(response["error"]["type"], expected, "response: {response}");
    response
}
