//! `SQLite` storage for commonsgraph.
//!
//! Implements the core [`MediaStorePort`](cgraph_core::MediaStorePort) and
//! [`LabelRepository`](cgraph_core::LabelRepository) on one `sqlx` pool:
//! cached media entities, user annotations, entity labels, and live
//! queries driven by post-commit change notifications.
#![deny(unsafe_code)]

pub mod factory;
pub mod repositories;
pub mod setup;

pub use factory::StoreFactory;

#[cfg(any(test, feature = "test-utils"))]
pub use factory::TestDb;

pub use repositories::{SqliteLabelRepository, SqliteMediaStore};

pub use setup::setup_database;
#[cfg(any(test, feature = "test-utils"))]
pub use setup::setup_test_database;
