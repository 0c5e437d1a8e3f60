//! Composition utilities for wiring `SQLite` stores.
//!
//! Construction only; no domain logic.

use std::sync::Arc;

use sqlx::SqlitePool;

use cgraph_core::Stores;

use crate::repositories::{SqliteLabelRepository, SqliteMediaStore};

/// Factory for store instances backed by one `SQLite` pool.
pub struct StoreFactory;

impl StoreFactory {
    /// Build every store from a pool.
    ///
    /// Returns the core [`Stores`] container so consumers never name a
    /// concrete store type.
    pub fn build_stores(pool: SqlitePool) -> Stores {
        Stores::new(
            Self::media_store(pool.clone()),
            Arc::new(SqliteLabelRepository::new(pool)),
        )
    }

    /// Create the media store from a pool.
    pub fn media_store(pool: SqlitePool) -> Arc<SqliteMediaStore> {
        Arc::new(SqliteMediaStore::new(pool))
    }
}

/// In-memory database and stores for integration tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pub pool: SqlitePool,
    pub stores: Stores,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Fresh in-memory database with the production schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        let stores = StoreFactory::build_stores(pool.clone());
        Ok(Self { pool, stores })
    }
}
