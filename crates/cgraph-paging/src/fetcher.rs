//! One remote list, fetched a page at a time.

use std::collections::HashSet;
use std::sync::Arc;

use cgraph_core::{ApiPortResult, IdKind, Identifier, ListSourcePort};
use tracing::debug;

use crate::cursor::ContinuationCursor;

/// Prefix of `MediaInfo` entity ids (`M12345` is page 12345).
const MEDIAINFO_PREFIX: char = 'M';

/// Result of one successful page fetch, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Normalized ids not in `seen` and unique within the page, in page order.
    pub new_ids: Vec<Identifier>,
    /// Cursor to store once `new_ids` are queued.
    pub next_cursor: ContinuationCursor,
}

/// Wraps a [`ListSourcePort`] and normalizes what it returns.
///
/// Fetching has no side effects besides the network call; the caller
/// decides whether to commit the outcome.
#[derive(Clone)]
pub struct SourceFetcher {
    source: Arc<dyn ListSourcePort>,
    kind: IdKind,
}

impl SourceFetcher {
    pub fn new(source: Arc<dyn ListSourcePort>, kind: IdKind) -> Self {
        Self { source, kind }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Fetch the page after `cursor`.
    ///
    /// A finished cursor returns an empty outcome without touching the
    /// network.
    ///
    /// # Errors
    ///
    /// Propagates the list source's error; the cursor should be left as is.
    pub async fn fetch(
        &self,
        term: &str,
        cursor: &ContinuationCursor,
        seen: &HashSet<Identifier>,
    ) -> ApiPortResult<FetchOutcome> {
        if !cursor.can_continue() {
            return Ok(FetchOutcome {
                new_ids: Vec::new(),
                next_cursor: cursor.clone(),
            });
        }

        let page = self.source.search(term, cursor.token()).await?;
        let raw_count = page.items.len();

        let mut in_page = HashSet::new();
        let new_ids: Vec<Identifier> = page
            .items
            .iter()
            .filter_map(|raw| normalize(raw, self.kind))
            .filter(|id| !seen.contains(id) && in_page.insert(id.clone()))
            .collect();

        debug!(
            source = %self.name(),
            raw = raw_count,
            new = new_ids.len(),
            more = page.next.is_some(),
            "Fetched list page"
        );

        Ok(FetchOutcome {
            new_ids,
            next_cursor: cursor.advance(page.next),
        })
    }
}

/// Turn a raw list item into an identifier of `kind`.
///
/// Titles are trimmed. Page ids may carry the `MediaInfo` prefix. Empty
/// strings, unparsable numbers and page id 0 yield `None`.
pub fn normalize(raw: &str, kind: IdKind) -> Option<Identifier> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match kind {
        IdKind::Title => Some(Identifier::title(raw)),
        IdKind::PageId => {
            let digits = raw.strip_prefix(MEDIAINFO_PREFIX).unwrap_or(raw);
            digits
                .parse::<u64>()
                .ok()
                .filter(|id| *id > 0)
                .map(Identifier::page_id)
        }
    }
}
