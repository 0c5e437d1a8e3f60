//! Paginated list endpoints.

use cgraph_core::ContinuationToken;
use tracing::debug;

use crate::error::ApiResult;
use crate::http::HttpBackend;
use crate::models::{CategoryMembersQuery, PageRef, QueryResponse, SearchQuery};
use crate::parsing::continuation_token;
use crate::url::{build_category_members_url, build_depicts_search_url};

use super::ApiClient;

/// One page of list rows and the token for the next page.
#[derive(Debug, Default)]
pub(crate) struct RawListPage {
    pub rows: Vec<PageRef>,
    pub next: Option<ContinuationToken>,
}

impl<B: HttpBackend> ApiClient<B> {
    /// One page of files in a category.
    pub(crate) async fn category_members(
        &self,
        category: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiResult<RawListPage> {
        let url = build_category_members_url(&self.config, category, continuation);
        let response: QueryResponse<CategoryMembersQuery> = self.get_action(&url).await?;

        let rows = response.query.unwrap_or_default().categorymembers;
        let next = continuation_token(response.continuation);
        debug!(category, rows = rows.len(), more = next.is_some(), "Category page");
        Ok(RawListPage { rows, next })
    }

    /// One page of files whose structured data matches `term`.
    pub(crate) async fn depicts_search(
        &self,
        term: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiResult<RawListPage> {
        let url = build_depicts_search_url(&self.config, term, continuation);
        let response: QueryResponse<SearchQuery> = self.get_action(&url).await?;

        let rows = response.query.unwrap_or_default().search;
        let next = continuation_token(response.continuation);
        debug!(term, rows = rows.len(), more = next.is_some(), "Search page");
        Ok(RawListPage { rows, next })
    }
}
