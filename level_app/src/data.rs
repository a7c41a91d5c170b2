//! Data file loading for the walkthrough

use serde::de::DeserializeOwned;
use std::path::Path;
use tile_engine::level::RuntimeError;

/// Read and parse a RON file
pub fn load_ron<T: DeserializeOwned>(path: &Path) -> Result<T, RuntimeError> {
    let source = std::fs::read_to_string(path).map_err(|e| RuntimeError::Data {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    ron::from_str(&source).map_err(|e| RuntimeError::Data {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
