//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use cgraph_core::{AnnotatedEntity, Annotation, MediaEntity, RepositoryError};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Shared SELECT for entity queries, joined with their annotation.
pub const ANNOTATED_SELECT: &str = "SELECT m.payload, a.page_id AS annotated, a.bookmarked, a.last_viewed_at \
     FROM media_entities m LEFT JOIN annotations a ON a.page_id = m.page_id";

/// Largest number of bound parameters per statement.
pub const MAX_BIND_PARAMS: usize = 500;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub fn storage(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Format a timestamp so that lexical order equals chronological order.
pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

pub fn parse_datetime(datetime_str: Option<String>) -> Option<DateTime<Utc>> {
    datetime_str.and_then(|s| {
        NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT)
            .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
            .ok()
    })
}

/// Page ids are stored as `INTEGER`.
pub fn to_db_id(page_id: u64) -> Result<i64, RepositoryError> {
    i64::try_from(page_id)
        .map_err(|_| RepositoryError::Constraint(format!("page id {page_id} out of range")))
}

/// `?, ?, ?` for `n` parameters.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Parse a row produced by [`ANNOTATED_SELECT`].
pub fn row_to_annotated(row: &SqliteRow) -> Result<AnnotatedEntity, RepositoryError> {
    let payload: String = row.try_get("payload").map_err(storage)?;
    let entity: MediaEntity = serde_json::from_str(&payload)
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

    let annotated: Option<i64> = row.try_get("annotated").map_err(storage)?;
    let annotation = match annotated {
        Some(_) => {
            let bookmarked: Option<i64> = row.try_get("bookmarked").map_err(storage)?;
            let last_viewed_at: Option<String> = row.try_get("last_viewed_at").map_err(storage)?;
            Some(Annotation {
                bookmarked: bookmarked.unwrap_or(0) != 0,
                last_viewed_at: parse_datetime(last_viewed_at),
            })
        }
        None => None,
    };

    Ok(AnnotatedEntity::new(entity, annotation))
}
