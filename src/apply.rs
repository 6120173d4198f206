use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::GradleditError;
use crate::hash::script_hash;

mod io;


use io::{ScriptLock, Snapshot, lock_script, read_snapshot, replace_atomically};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Committed,
    Unchanged,
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub file: String,
    pub status: CommitStatus,
    pub source_hash: String,
    pub result_hash: String,
    /// Rewritten text, only reported for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug)]
pub struct ScriptSession {
    path: PathBuf,
    text: String,
    snapshot: Snapshot,
    _lock: ScriptLock,
}

impl ScriptSession {
    /// Locks `path` and reads it. Fails with `ResourceBusy` when another
    /// session holds the lock.
    pub fn open(path: &Path) -> Result<Self, GradleditError> {
        let lock = lock_script(path)?;
        let (snapshot, bytes) = read_snapshot(path)?;
        let text = String::from_utf8(bytes).map_err(|_| GradleditError::InvalidRequest {
            message: format!("Script '{}' is not valid UTF-8", path.display()),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
            snapshot,
            _lock: lock,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_hash(&self) -> &str {
        &self.snapshot.hash
    }

    /// Checks a caller-supplied hash of the script they computed edits from.
    pub fn require_hash(&self, expected: Option<&str>) -> Result<(), GradleditError> {
        match expected {
            Some(expected) if expected != self.snapshot.hash => {
                Err(GradleditError::PreconditionFailed {
                    expected_hash: expected.to_string(),
                    actual_hash: self.snapshot.hash.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Replaces the script with `updated` unless this is a dry run or
    /// nothing changed. The lock is released when the session is consumed.
    pub fn commit(self, updated: String, dry_run: bool) -> Result<CommitReport, GradleditError> {
        let result_hash = script_hash(updated.as_bytes());
        let file = self.path.display().to_string();

        let (status, preview) = if dry_run {
            (CommitStatus::DryRun, Some(updated))
        } else if updated == self.text {
            (CommitStatus::Unchanged, None)
        } else {
            replace_atomically(&self.path, &updated, &self.snapshot)?;
            info!(
                file = %file,
                from = %self.snapshot.hash,
                to = %result_hash,
                "committed script"
            );
            (CommitStatus::Committed, None)
        };

        Ok(CommitReport {
            file,
            status,
            source_hash: self.snapshot.hash.clone(),
            result_hash,
            preview,
        })
    }
}
