//! Filesystem locations used by commonsgraph.
//!
//! The data root honours `CGRAPH_DATA_DIR` and otherwise falls back to the
//! platform data directory.

mod error;
mod platform;

pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, database_path};
