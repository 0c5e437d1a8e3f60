//! URL construction for the Action API.

use cgraph_core::{ContinuationToken, Identifier};
use url::form_urlencoded::Serializer;
use url::{Url, UrlQuery};

use crate::models::ApiConfig;

/// File namespace.
const FILE_NAMESPACE: &str = "6";

/// `imageinfo` properties requested during resolution.
const IMAGEINFO_PROPS: &str = "url|size|mime|user|timestamp|extmetadata";

/// `extmetadata` fields we read.
const EXTMETADATA_FILTER: &str = "ImageDescription|LicenseShortName";

type Query<'a> = Serializer<'a, UrlQuery<'a>>;

/// Parameters every request carries.
fn common_params(query: &mut Query<'_>, config: &ApiConfig) {
    query
        .append_pair("format", "json")
        .append_pair("formatversion", "2")
        .append_pair("maxlag", &config.max_lag.to_string());
}

fn append_continuation(query: &mut Query<'_>, continuation: Option<&ContinuationToken>) {
    if let Some(token) = continuation {
        for (key, value) in token.params() {
            query.append_pair(key, value);
        }
    }
}

/// Prefix `term` with `Category:` unless it already has it.
pub fn category_title(term: &str) -> String {
    let term = term.trim();
    let has_prefix = term
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("category:"));
    if has_prefix {
        format!("Category:{}", &term[9..])
    } else {
        format!("Category:{term}")
    }
}

/// Whether `term` is a bare entity id like `Q42`.
pub fn is_entity_id(term: &str) -> bool {
    term.strip_prefix('Q')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Search expression for files depicting `term`.
///
/// An entity id becomes a `haswbstatement` filter; anything else is passed
/// through as free text.
pub fn depicts_expression(term: &str) -> String {
    let term = term.trim();
    if is_entity_id(term) {
        format!("haswbstatement:P180={term}")
    } else {
        term.to_string()
    }
}

/// Build a `list=categorymembers` URL for files in `category`.
pub fn build_category_members_url(
    config: &ApiConfig,
    category: &str,
    continuation: Option<&ContinuationToken>,
) -> Url {
    let mut url = config.commons_url.clone();
    {
        let mut query = url.query_pairs_mut();
        common_params(&mut query, config);
        query
            .append_pair("action", "query")
            .append_pair("list", "categorymembers")
            .append_pair("cmtitle", &category_title(category))
            .append_pair("cmtype", "file")
            .append_pair("cmlimit", &config.page_limit.to_string());
        append_continuation(&mut query, continuation);
    }
    url
}

/// Build a `list=search` URL over the file namespace.
pub fn build_depicts_search_url(
    config: &ApiConfig,
    term: &str,
    continuation: Option<&ContinuationToken>,
) -> Url {
    let mut url = config.commons_url.clone();
    {
        let mut query = url.query_pairs_mut();
        common_params(&mut query, config);
        query
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", &depicts_expression(term))
            .append_pair("srnamespace", FILE_NAMESPACE)
            .append_pair("srinfo", "")
            .append_pair("srprop", "")
            .append_pair("srlimit", &config.page_limit.to_string());
        append_continuation(&mut query, continuation);
    }
    url
}

/// Build a `prop=imageinfo|info` URL for a batch of identifiers of one kind.
pub fn build_pages_url(config: &ApiConfig, ids: &[Identifier]) -> Url {
    let mut url = config.commons_url.clone();
    {
        let mut query = url.query_pairs_mut();
        common_params(&mut query, config);
        query
            .append_pair("action", "query")
            .append_pair("prop", "imageinfo|info")
            .append_pair("iiprop", IMAGEINFO_PROPS)
            .append_pair("iiurlwidth", &config.thumbnail_width.to_string())
            .append_pair("iiextmetadatafilter", EXTMETADATA_FILTER)
            .append_pair("iiextmetadatalanguage", &config.language);

        let titles: Vec<&str> = ids.iter().filter_map(Identifier::as_title).collect();
        if titles.is_empty() {
            let page_ids: Vec<String> = ids
                .iter()
                .filter_map(Identifier::as_page_id)
                .map(|id| id.to_string())
                .collect();
            query.append_pair("pageids", &page_ids.join("|"));
        } else {
            query.append_pair("titles", &titles.join("|"));
        }
    }
    url
}

/// Build a `wbgetentities` URL for the `MediaInfo` entities of `page_ids`.
pub fn build_mediainfo_url(config: &ApiConfig, page_ids: &[u64]) -> Url {
    let ids: Vec<String> = page_ids.iter().map(|id| format!("M{id}")).collect();
    let mut url = config.commons_url.clone();
    {
        let mut query = url.query_pairs_mut();
        common_params(&mut query, config);
        query
            .append_pair("action", "wbgetentities")
            .append_pair("ids", &ids.join("|"))
            .append_pair("props", "claims");
    }
    url
}

/// Build a `wbgetentities` URL for labels of knowledge-graph entities.
pub fn build_labels_url(config: &ApiConfig, entity_ids: &[String], language: &str) -> Url {
    let mut url = config.wikidata_url.clone();
    {
        let mut query = url.query_pairs_mut();
        common_params(&mut query, config);
        query
            .append_pair("action", "wbgetentities")
            .append_pair("ids", &entity_ids.join("|"))
            .append_pair("props", "labels")
            .append_pair("languages", language)
            .append_pair("languagefallback", "1");
    }
    url
}
