//! List sources backed by the Action API.
//!
//! Both sources emit raw ids in the shape the configured [`IdKind`] expects:
//! titles verbatim, or page ids as decimal strings. Search results carry
//! page ids in their `MediaInfo` form (`M123`).

use std::sync::Arc;

use async_trait::async_trait;
use cgraph_core::{ApiPortResult, ContinuationToken, IdKind, ListPage, ListSourcePort};

use crate::client::ApiClient;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::PageRef;
use crate::port::map_error;

fn raw_ids(rows: Vec<PageRef>, kind: IdKind, page_id_prefix: &str) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| match kind {
            IdKind::Title => Some(row.title),
            IdKind::PageId => row.pageid.map(|id| format!("{page_id_prefix}{id}")),
        })
        .collect()
}

// ============================================================================
// Category members
// ============================================================================

/// Files that are direct members of a category.
pub struct CategoryMembersSource<B: HttpBackend = ReqwestBackend> {
    client: Arc<ApiClient<B>>,
    kind: IdKind,
}

impl<B: HttpBackend> CategoryMembersSource<B> {
    pub const fn new(client: Arc<ApiClient<B>>, kind: IdKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl<B: HttpBackend> ListSourcePort for CategoryMembersSource<B> {
    fn name(&self) -> &str {
        "category"
    }

    async fn search(
        &self,
        term: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiPortResult<ListPage> {
        let page = self
            .client
            .category_members(term, continuation)
            .await
            .map_err(map_error)?;
        Ok(ListPage {
            items: raw_ids(page.rows, self.kind, ""),
            next: page.next,
        })
    }
}

// ============================================================================
// Depicts search
// ============================================================================

/// Files whose structured data depicts the searched entity.
///
/// A bare entity id (`Q146`) searches `haswbstatement:P180=Q146`; any other
/// term is a free-text search over the file namespace.
pub struct DepictsSearchSource<B: HttpBackend = ReqwestBackend> {
    client: Arc<ApiClient<B>>,
    kind: IdKind,
}

impl<B: HttpBackend> DepictsSearchSource<B> {
    pub const fn new(client: Arc<ApiClient<B>>, kind: IdKind) -> Self {
        Self { client, kind }
    }
}

#[async_trait]
impl<B: HttpBackend> ListSourcePort for DepictsSearchSource<B> {
    fn name(&self) -> &str {
        "depicts"
    }

    async fn search(
        &self,
        term: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiPortResult<ListPage> {
        let page = self
            .client
            .depicts_search(term, continuation)
            .await
            .map_err(map_error)?;
        Ok(ListPage {
            items: raw_ids(page.rows, self.kind, "M"),
            next: page.next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_config;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use cgraph_core::ApiPortError;
    use serde_json::json;

    fn category_page() -> serde_json::Value {
        json!({
            "continue": {"cmcontinue": "file|B|2", "continue": "-||"},
            "query": {"categorymembers": [
                {"pageid": 1, "ns": 6, "title": "File:A.jpg"},
                {"pageid": 2, "ns": 6, "title": "File:B.jpg"}
            ]}
        })
    }

    #[tokio::test]
    async fn test_category_source_emits_titles() {
        let backend = FakeBackend::new().with_response("list=categorymembers", category_page());
        let source = CategoryMembersSource::new(
            Arc::new(ApiClient::with_backend(test_config(), backend)),
            IdKind::Title,
        );

        let page = source.search("Cats", None).await.unwrap();
        assert_eq!(page.items, vec!["File:A.jpg", "File:B.jpg"]);
        assert!(page.next.is_some());
    }

    #[tokio::test]
    async fn test_category_source_follows_token() {
        let backend = FakeBackend::new()
            .with_response("cmcontinue=file", json!({"query": {"categorymembers": [
                {"pageid": 3, "ns": 6, "title": "File:C.jpg"}
            ]}}))
            .with_response("list=categorymembers", category_page());
        let source = CategoryMembersSource::new(
            Arc::new(ApiClient::with_backend(test_config(), backend.clone())),
            IdKind::PageId,
        );

        let first = source.search("Cats", None).await.unwrap();
        let second = source.search("Cats", first.next.as_ref()).await.unwrap();

        assert_eq!(first.items, vec!["1", "2"]);
        assert_eq!(second.items, vec!["3"]);
        assert!(second.next.is_none());
        assert_eq!(backend.count("cmcontinue=file"), 1);
    }

    #[tokio::test]
    async fn test_depicts_source_emits_prefixed_page_ids() {
        let backend = FakeBackend::new().with_response(
            "list=search",
            json!({"query": {"search": [
                {"ns": 6, "title": "File:C.jpg", "pageid": 30},
                {"ns": 6, "title": "File:D.jpg"}
            ]}}),
        );
        let source = DepictsSearchSource::new(
            Arc::new(ApiClient::with_backend(test_config(), backend)),
            IdKind::PageId,
        );

        let page = source.search("Q146", None).await.unwrap();
        assert_eq!(page.items, vec!["M30"]);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_port_error() {
        let backend = FakeBackend::new().with_response("list=search", CannedResponse::Status(429));
        let source = DepictsSearchSource::new(
            Arc::new(ApiClient::with_backend(test_config(), backend)),
            IdKind::Title,
        );

        let result = source.search("Q146", None).await;
        assert!(matches!(result, Err(ApiPortError::RateLimited)));
    }
}
