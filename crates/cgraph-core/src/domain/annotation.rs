//! User annotations stored next to cached entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::MediaEntity;

/// Local, user-driven state for one media page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub bookmarked: bool,
    pub last_viewed_at: Option<DateTime<Utc>>,
}

/// An entity as the local store sees it.
///
/// `annotation` is `None` when the user never bookmarked or viewed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedEntity {
    pub entity: MediaEntity,
    pub annotation: Option<Annotation>,
}

impl AnnotatedEntity {
    pub const fn new(entity: MediaEntity, annotation: Option<Annotation>) -> Self {
        Self { entity, annotation }
    }

    pub fn is_bookmarked(&self) -> bool {
        self.annotation.as_ref().is_some_and(|a| a.bookmarked)
    }
}
