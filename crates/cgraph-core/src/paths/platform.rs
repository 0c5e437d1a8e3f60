//! Platform-specific path resolution.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "CGRAPH_DATA_DIR";

const APP_DIR_NAME: &str = "commonsgraph";
const DATABASE_FILE_NAME: &str = "commonsgraph.db";

/// Root directory for persisted state.
///
/// `$CGRAPH_DATA_DIR` when set and non-empty, otherwise
/// `<platform data dir>/commonsgraph`.
pub fn data_root() -> Result<PathBuf, PathError> {
    resolve_data_root(std::env::var_os(DATA_DIR_ENV), dirs::data_dir())
}

fn resolve_data_root(
    env_override: Option<OsString>,
    platform_dir: Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(dir) = env_override.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    platform_dir
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(PathError::NoDataDir)
}

/// Path to the `SQLite` database file.
///
/// The parent directory is created if it doesn't exist.
pub fn database_path() -> Result<PathBuf, PathError> {
    database_path_in(&data_root()?)
}

fn database_path_in(root: &Path) -> Result<PathBuf, PathError> {
    if root.exists() && !root.is_dir() {
        return Err(PathError::NotADirectory(root.to_path_buf()));
    }

    fs::create_dir_all(root).map_err(|e| PathError::CreateFailed {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(root.join(DATABASE_FILE_NAME))
}
