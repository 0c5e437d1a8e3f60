//! Errors from locating the data directory.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to locate or prepare the directory holding the local store.
#[derive(Debug, Error)]
pub enum PathError {
    /// The platform reports no data directory and no override is set.
    #[error("Cannot determine a data directory; set CGRAPH_DATA_DIR")]
    NoDataDir,

    /// The data root exists but is a file.
    #[error("Data root {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to create data root {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },
}
