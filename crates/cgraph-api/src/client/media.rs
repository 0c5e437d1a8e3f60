//! Batch entity resolution.

use std::collections::HashMap;

use cgraph_core::{Identifier, MAX_ENTITY_BATCH, MediaEntity, ResolvedEntity, Statement};
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::http::HttpBackend;
use crate::models::{EntitiesResponse, PagesQuery, QueryResponse};
use crate::parsing::{match_requested, page_to_entity, statements_by_page};
use crate::url::{build_mediainfo_url, build_pages_url};

use super::ApiClient;

impl<B: HttpBackend> ApiClient<B> {
    /// Resolve identifiers of one kind into entities, in request order.
    ///
    /// Ids that do not exist are left out. When structured data is enabled,
    /// statements are attached; a failure there only loses the statements.
    pub(crate) async fn resolve_pages(&self, ids: &[Identifier]) -> ApiResult<Vec<ResolvedEntity>> {
        let mut resolved = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_ENTITY_BATCH) {
            resolved.extend(self.resolve_chunk(chunk).await?);
        }
        Ok(resolved)
    }

    async fn resolve_chunk(&self, ids: &[Identifier]) -> ApiResult<Vec<ResolvedEntity>> {
        let url = build_pages_url(&self.config, ids);
        let response: QueryResponse<PagesQuery> = self.get_action(&url).await?;
        let query = response.query.unwrap_or_default();

        let mut entities: Vec<MediaEntity> = query.pages.iter().filter_map(page_to_entity).collect();
        debug!(requested = ids.len(), found = entities.len(), "Resolved pages");

        if self.config.structured_data && !entities.is_empty() {
            let page_ids: Vec<u64> = entities.iter().map(|e| e.page_id).collect();
            match self.fetch_statements(&page_ids).await {
                Ok(mut statements) => {
                    for entity in &mut entities {
                        if let Some(found) = statements.remove(&entity.page_id) {
                            entity.statements = found;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Structured data unavailable, continuing without"),
            }
        }

        Ok(match_requested(ids, &query.normalized, &entities))
    }

    /// Statements of the `MediaInfo` entities behind `page_ids`.
    pub(crate) async fn fetch_statements(
        &self,
        page_ids: &[u64],
    ) -> ApiResult<HashMap<u64, Vec<Statement>>> {
        let url = build_mediainfo_url(&self.config, page_ids);
        let response: EntitiesResponse = self.get_action(&url).await?;
        Ok(statements_by_page(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_config;
    use super::*;
    use crate::http::testing::{CannedResponse, FakeBackend};
    use crate::models::ApiConfig;
    use serde_json::json;

    fn pages_json() -> serde_json::Value {
        json!({
            "query": {
                "normalized": [{"fromencoded": false, "from": "File:a.jpg", "to": "File:A.jpg"}],
                "pages": [
                    {"pageid": 1, "ns": 6, "title": "File:A.jpg", "imageinfo": [{"mime": "image/jpeg"}]},
                    {"ns": 6, "title": "File:Gone.jpg", "missing": true},
                    {"pageid": 2, "ns": 6, "title": "File:B.jpg"}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_resolve_pages_in_request_order() {
        let backend = FakeBackend::new().with_response("prop=imageinfo", pages_json());
        let client = ApiClient::with_backend(test_config(), backend);

        let ids = vec![
            Identifier::title("File:B.jpg"),
            Identifier::title("File:Gone.jpg"),
            Identifier::title("File:a.jpg"),
        ];
        let resolved = client.resolve_pages(&ids).await.unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].entity.page_id, 2);
        assert_eq!(resolved[1].requested, Identifier::title("File:a.jpg"));
        assert_eq!(resolved[1].entity.title, "File:A.jpg");
        assert_eq!(resolved[1].entity.mime.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_statements_are_attached() {
        let backend = FakeBackend::new()
            .with_response("prop=imageinfo", pages_json())
            .with_response(
                "action=wbgetentities",
                json!({"entities": {"M1": {"id": "M1", "statements": {"P180": [{
                    "mainsnak": {
                        "snaktype": "value",
                        "property": "P180",
                        "datavalue": {"type": "wikibase-entityid", "value": {"entity-type": "item", "id": "Q146"}}
                    }
                }]}}}}),
            );
        let config = ApiConfig {
            structured_data: true,
            ..ApiConfig::default()
        };
        let client = ApiClient::with_backend(config, backend);

        let resolved = client.resolve_pages(&[Identifier::title("File:A.jpg")]).await.unwrap();
        assert_eq!(resolved[0].entity.depicts(), vec!["Q146"]);
    }

    #[tokio::test]
    async fn test_statement_failure_keeps_entities() {
        let backend = FakeBackend::new()
            .with_response("prop=imageinfo", pages_json())
            .with_response("action=wbgetentities", CannedResponse::Status(500));
        let config = ApiConfig {
            structured_data: true,
            ..ApiConfig::default()
        };
        let client = ApiClient::with_backend(config, backend);

        let resolved = client.resolve_pages(&[Identifier::title("File:A.jpg")]).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].entity.statements.is_empty());
    }

    #[tokio::test]
    async fn test_large_batches_are_chunked() {
        let backend = FakeBackend::new().with_response("prop=imageinfo", json!({"query": {"pages": []}}));
        let client = ApiClient::with_backend(test_config(), backend.clone());

        let ids: Vec<Identifier> = (1..=120).map(Identifier::page_id).collect();
        let resolved = client.resolve_pages(&ids).await.unwrap();

        assert!(resolved.is_empty());
        assert_eq!(backend.count("prop=imageinfo"), 3);
    }
}
