//! `SQLite` implementation of the `LabelRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use cgraph_core::{LabelRepository, RepositoryError};

use super::row_mappers::{MAX_BIND_PARAMS, format_datetime, placeholders, storage};

/// Persisted knowledge-graph labels, one row per entity and language.
pub struct SqliteLabelRepository {
    pool: SqlitePool,
}

impl SqliteLabelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LabelRepository for SqliteLabelRepository {
    async fn get_labels(
        &self,
        entity_ids: &[String],
        language: &str,
    ) -> Result<HashMap<String, String>, RepositoryError> {
        let mut labels = HashMap::with_capacity(entity_ids.len());

        for chunk in entity_ids.chunks(MAX_BIND_PARAMS) {
            let sql = format!(
                "SELECT entity_id, label FROM entity_labels WHERE language = ? AND entity_id IN ({})",
                placeholders(chunk.len())
            );
            let mut query = sqlx::query(&sql).bind(language);
            for id in chunk {
                query = query.bind(id);
            }

            for row in query.fetch_all(&self.pool).await.map_err(storage)? {
                let entity_id: String = row.try_get("entity_id").map_err(storage)?;
                let label: String = row.try_get("label").map_err(storage)?;
                labels.insert(entity_id, label);
            }
        }

        Ok(labels)
    }

    async fn save_labels(
        &self,
        labels: &HashMap<String, String>,
        language: &str,
    ) -> Result<(), RepositoryError> {
        if labels.is_empty() {
            return Ok(());
        }

        let now = format_datetime(Utc::now());
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for (entity_id, label) in labels {
            sqlx::query(
                r"
                INSERT INTO entity_labels (entity_id, language, label, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(entity_id, language) DO UPDATE SET
                    label = excluded.label,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(entity_id)
            .bind(language)
            .bind(label)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    #[tokio::test]
    async fn test_save_and_get_labels() {
        let repo = SqliteLabelRepository::new(setup_test_database().await.unwrap());

        let labels: HashMap<String, String> = [
            ("Q146".to_string(), "house cat".to_string()),
            ("Q5".to_string(), "human".to_string()),
        ]
        .into_iter()
        .collect();
        repo.save_labels(&labels, "en").await.unwrap();

        let found = repo
            .get_labels(&["Q146".to_string(), "Q1".to_string()], "en")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["Q146"], "house cat");

        let other_language = repo.get_labels(&["Q146".to_string()], "de").await.unwrap();
        assert!(other_language.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_label() {
        let repo = SqliteLabelRepository::new(setup_test_database().await.unwrap());
        let first: HashMap<String, String> =
            [("Q146".to_string(), "cat".to_string())].into_iter().collect();
        let second: HashMap<String, String> =
            [("Q146".to_string(), "house cat".to_string())].into_iter().collect();

        repo.save_labels(&first, "en").await.unwrap();
        repo.save_labels(&second, "en").await.unwrap();

        let found = repo.get_labels(&["Q146".to_string()], "en").await.unwrap();
        assert_eq!(found["Q146"], "house cat");
    }
}
