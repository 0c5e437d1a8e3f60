//! Resolved media file pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifier::{IdKind, Identifier};
use super::statement::{DEPICTS_PROPERTY, Statement};

/// A fully resolved media file page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntity {
    pub page_id: u64,
    /// Canonical page title, e.g. `File:Example.jpg`.
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// URL of the original file.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub mime: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// File size in bytes.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Short license name, e.g. `CC BY-SA 4.0`.
    #[serde(default)]
    pub license: Option<String>,
    /// Structured-data statements, empty when not fetched.
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl MediaEntity {
    /// Minimal entity with only the page id and title set.
    pub fn new(page_id: u64, title: impl Into<String>) -> Self {
        Self {
            page_id,
            title: title.into(),
            description: None,
            url: None,
            thumbnail_url: None,
            mime: None,
            width: None,
            height: None,
            size: None,
            uploader: None,
            uploaded_at: None,
            license: None,
            statements: Vec::new(),
        }
    }

    /// This entity's identifier of the given kind.
    pub fn identifier(&self, kind: IdKind) -> Identifier {
        match kind {
            IdKind::Title => Identifier::Title(self.title.clone()),
            IdKind::PageId => Identifier::PageId(self.page_id),
        }
    }

    /// Whether this entity is the one named by `id`.
    pub fn matches(&self, id: &Identifier) -> bool {
        match id {
            Identifier::Title(title) => *title == self.title,
            Identifier::PageId(page_id) => *page_id == self.page_id,
        }
    }

    /// Entity ids of everything this file depicts, in statement order.
    pub fn depicts(&self) -> Vec<&str> {
        self.statements
            .iter()
            .filter(|statement| statement.property() == DEPICTS_PROPERTY)
            .filter_map(|statement| statement.main_snak.value()?.as_entity_id())
            .collect()
    }
}
