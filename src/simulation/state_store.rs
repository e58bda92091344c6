use crate::simulation::step::RunId;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StateLookupError {
    #[error("invalid run id `{run_id}`")]
    InvalidRunId { run_id: String },
    #[error("no snapshot at {path}")]
    Missing { path: String },
    #[error("failed to read snapshot {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path} is not valid json: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StateLookupError {
    /// Unreadable and corrupt snapshots are worth an operator's attention; the caller
    /// still sees a plain not-found either way.
    pub fn is_damaged_snapshot(&self) -> bool {
        matches!(self, Self::Unreadable { .. } | Self::Corrupt { .. })
    }
}

/// Read-only access to the `<runId>.json` snapshots step scripts persist.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, run_id: &RunId) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }

    pub fn get_state(&self, run_id: &str) -> Result<Value, StateLookupError> {
        let run_id = RunId::parse(run_id).map_err(|_| StateLookupError::InvalidRunId {
            run_id: run_id.to_string(),
        })?;
        let path = self.snapshot_path(&run_id);
        let raw = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                StateLookupError::Missing {
                    path: path.display().to_string(),
                }
            } else {
                StateLookupError::Unreadable {
                    path: path.display().to_string(),
                    source,
                }
            }
        })?;
        serde_json::from_str(&raw).map_err(|source| StateLookupError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }
}
