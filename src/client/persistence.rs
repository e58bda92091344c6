use crate::client::view_model::ViewModel;
use crate::runtime::RuntimeError;
use crate::shared::fs_atomic::atomic_write_file;
use std::fs;
use std::path::Path;

/// A missing file is a fresh simulation.
pub fn load_view(path: &Path) -> Result<ViewModel, RuntimeError> {
    if !path.exists() {
        return Ok(ViewModel::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| RuntimeError::ReadState {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| RuntimeError::ParseState {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_view(path: &Path, view: &ViewModel) -> Result<(), RuntimeError> {
    let encoded = serde_json::to_vec_pretty(view).map_err(|source| RuntimeError::EncodeState {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(path, &encoded).map_err(|source| RuntimeError::WriteState {
        path: path.display().to_string(),
        source,
    })
}
