//! Remote list port: one independently paginated identifier list.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::api_error::ApiPortResult;

/// Opaque server-issued cursor telling a list where to resume.
///
/// The engine never looks inside; adapters store whatever parameters the
/// remote needs to continue (for the MediaWiki API, the `continue` object).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuationToken(BTreeMap<String, String>);

impl ContinuationToken {
    pub const fn new(params: BTreeMap<String, String>) -> Self {
        Self(params)
    }

    /// Query parameters to send with the next request.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContinuationToken {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One page of raw identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Raw ids as the remote returned them (may carry structural prefixes).
    pub items: Vec<String>,
    /// Token for the next page; `None` means end of list.
    pub next: Option<ContinuationToken>,
}

/// Port trait for a remote list operation.
///
/// Implementations must be side-effect free beyond the network call.
#[async_trait]
pub trait ListSourcePort: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch one page of ids for `term`, resuming at `continuation`.
    async fn search(
        &self,
        term: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiPortResult<ListPage>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_object_safe(_: Arc<dyn ListSourcePort>) {}

    #[test]
    fn test_token_params_are_sorted() {
        let token: ContinuationToken = [("continue", "-||"), ("cmcontinue", "file|abc|1")]
            .into_iter()
            .collect();

        let params: Vec<_> = token.params().collect();
        assert_eq!(params, vec![("cmcontinue", "file|abc|1"), ("continue", "-||")]);
        assert!(!token.is_empty());
    }
}
