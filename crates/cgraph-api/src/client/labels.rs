//! Label lookup on the knowledge graph.

use std::collections::HashMap;

use cgraph_core::MAX_ENTITY_BATCH;

use crate::error::ApiResult;
use crate::http::HttpBackend;
use crate::models::EntitiesResponse;
use crate::parsing::labels_from;
use crate::url::build_labels_url;

use super::ApiClient;

impl<B: HttpBackend> ApiClient<B> {
    /// Labels for `entity_ids` in `language`, with the API's language fallback.
    pub(crate) async fn fetch_labels(
        &self,
        entity_ids: &[String],
        language: &str,
    ) -> ApiResult<HashMap<String, String>> {
        let mut labels = HashMap::with_capacity(entity_ids.len());
        for chunk in entity_ids.chunks(MAX_ENTITY_BATCH) {
            let url = build_labels_url(&self.config, chunk, language);
            let response: EntitiesResponse = self.get_action(&url).await?;
            labels.extend(labels_from(&response, language));
        }
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_config;
    use super::*;
    use crate::http::testing::FakeBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_labels() {
        let backend = FakeBackend::new().with_response(
            "props=labels",
            json!({"entities": {
                "Q146": {"id": "Q146", "labels": {"en": {"language": "en", "value": "house cat"}}},
                "Q5": {"id": "Q5", "labels": {"en": {"language": "en", "value": "human"}}}
            }}),
        );
        let client = ApiClient::with_backend(test_config(), backend);

        let labels = client
            .fetch_labels(&["Q146".to_string(), "Q5".to_string()], "en")
            .await
            .unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["Q5"], "human");
    }
}
