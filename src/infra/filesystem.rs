//! Filesystem operations
//!
//! Directory handling for the build root, distfiles cache, and clean step.

use std::path::Path;

use crate::error::ConfigError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(path).map_err(|e| ConfigError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory tree if it exists
pub fn remove_dir_all(path: &Path) -> Result<(), std::io::Error> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}
