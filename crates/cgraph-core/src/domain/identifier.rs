//! Identifiers for remote media pages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of identifier a pagination pipeline operates on.
///
/// A single engine uses exactly one kind for its whole lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// Page titles such as `File:Example.jpg`.
    #[default]
    Title,
    /// Numeric page ids.
    PageId,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::PageId => f.write_str("page id"),
        }
    }
}

/// Identifier of a media page, either by title or by numeric page id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    /// Page title.
    Title(String),
    /// Numeric page id.
    PageId(u64),
}

impl Identifier {
    /// Create a title identifier.
    pub fn title(title: impl Into<String>) -> Self {
        Self::Title(title.into())
    }

    /// Create a page id identifier.
    #[must_use]
    pub const fn page_id(id: u64) -> Self {
        Self::PageId(id)
    }

    /// The kind of this identifier.
    #[must_use]
    pub const fn kind(&self) -> IdKind {
        match self {
            Self::Title(_) => IdKind::Title,
            Self::PageId(_) => IdKind::PageId,
        }
    }

    /// The title, if this is a title identifier.
    pub fn as_title(&self) -> Option<&str> {
        match self {
            Self::Title(title) => Some(title),
            Self::PageId(_) => None,
        }
    }

    /// The page id, if this is a page id identifier.
    #[must_use]
    pub const fn as_page_id(&self) -> Option<u64> {
        match self {
            Self::PageId(id) => Some(*id),
            Self::Title(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title(title) => f.write_str(title),
            Self::PageId(id) => write!(f, "#{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Identifier::title("File:A.jpg").kind(), IdKind::Title);
        assert_eq!(Identifier::page_id(7).kind(), IdKind::PageId);
    }

    #[test]
    fn test_accessors() {
        let title = Identifier::title("File:A.jpg");
        assert_eq!(title.as_title(), Some("File:A.jpg"));
        assert_eq!(title.as_page_id(), None);

        let id = Identifier::page_id(42);
        assert_eq!(id.as_page_id(), Some(42));
        assert_eq!(id.as_title(), None);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Identifier::page_id(5)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "page_id", "value": 5}));
    }
}
