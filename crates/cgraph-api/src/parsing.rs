//! Conversion of raw API responses into core types.
//!
//! Everything here is synchronous and side-effect free.

use std::collections::{BTreeMap, HashMap};

use cgraph_core::{ContinuationToken, Identifier, MediaEntity, ResolvedEntity, Statement};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::{EntitiesResponse, ErrorBody, Normalized, RawEntity, RawImageInfo, RawPage};

// ============================================================================
// Envelope
// ============================================================================

/// Fail if the response carries an `error` object.
pub fn check_api_error(json: &Value) -> ApiResult<()> {
    let Some(error) = json.get("error") else {
        return Ok(());
    };
    let body: ErrorBody =
        serde_json::from_value(error.clone()).map_err(|e| ApiError::InvalidResponse {
            message: format!("malformed error object: {e}"),
        })?;
    Err(ApiError::Api {
        code: body.code,
        info: body.info,
    })
}

/// Convert the `continue` object into a token.
///
/// Values are forwarded verbatim as strings; numbers are rendered without
/// quotes. An absent or empty object means the list is exhausted.
pub fn continuation_token(raw: Option<BTreeMap<String, Value>>) -> Option<ContinuationToken> {
    let raw = raw?;
    let token: ContinuationToken = raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            _ => None,
        })
        .collect();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// Pages
// ============================================================================

/// Build an entity from a page row. Missing or invalid pages yield `None`.
pub fn page_to_entity(page: &RawPage) -> Option<MediaEntity> {
    if page.missing || page.invalid {
        return None;
    }
    let page_id = page.pageid.filter(|id| *id > 0)?;
    let title = page.title.as_deref()?;

    let mut entity = MediaEntity::new(page_id, title);
    if let Some(info) = page.imageinfo.first() {
        apply_image_info(&mut entity, info);
    }
    Some(entity)
}

fn apply_image_info(entity: &mut MediaEntity, info: &RawImageInfo) {
    entity.url.clone_from(&info.url);
    entity.thumbnail_url.clone_from(&info.thumburl);
    entity.mime.clone_from(&info.mime);
    entity.width = info.width;
    entity.height = info.height;
    entity.size = info.size;
    entity.uploader.clone_from(&info.user);
    entity.uploaded_at = info
        .timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));
    entity.description = extmetadata_text(info, "ImageDescription");
    entity.license = extmetadata_text(info, "LicenseShortName");
}

fn extmetadata_text(info: &RawImageInfo, key: &str) -> Option<String> {
    let text = match &info.extmetadata.get(key)?.value {
        Value::String(s) => strip_markup(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Drop HTML tags and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pair each requested identifier with the page it resolved to.
///
/// Honours title normalization (`file:a.jpg` → `File:A.jpg`). Results come
/// back in request order; ids without a page are omitted.
pub fn match_requested(
    ids: &[Identifier],
    normalized: &[Normalized],
    entities: &[MediaEntity],
) -> Vec<ResolvedEntity> {
    let renames: HashMap<&str, &str> = normalized
        .iter()
        .map(|n| (n.from.as_str(), n.to.as_str()))
        .collect();

    ids.iter()
        .filter_map(|requested| {
            let found = match requested {
                Identifier::Title(title) => {
                    let canonical = renames.get(title.as_str()).copied().unwrap_or(title);
                    entities.iter().find(|e| e.title == canonical)
                }
                Identifier::PageId(page_id) => entities.iter().find(|e| e.page_id == *page_id),
            };
            found.map(|entity| ResolvedEntity {
                requested: requested.clone(),
                entity: entity.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Entities
// ============================================================================

/// Decode the statements of a Wikibase entity.
///
/// Individual statements that fail to decode are skipped so that one
/// unsupported value type does not hide the rest.
pub fn parse_statements(entity: &RawEntity) -> Vec<Statement> {
    let Some(Value::Object(by_property)) = entity.statements.as_ref().or(entity.claims.as_ref())
    else {
        // Entities without statements serialize them as `[]`.
        return Vec::new();
    };

    let mut statements = Vec::new();
    for (property, values) in by_property {
        let Some(values) = values.as_array() else {
            continue;
        };
        for value in values {
            match serde_json::from_value::<Statement>(value.clone()) {
                Ok(statement) => statements.push(statement),
                Err(e) => debug!(property = %property, error = %e, "Skipping statement"),
            }
        }
    }
    statements
}

/// Statements keyed by page id from a `MediaInfo` `wbgetentities` response.
pub fn statements_by_page(response: &EntitiesResponse) -> HashMap<u64, Vec<Statement>> {
    response
        .entities
        .iter()
        .filter(|(_, entity)| entity.missing.is_none())
        .filter_map(|(key, entity)| {
            let id = entity.id.as_deref().unwrap_or(key);
            let page_id = id.strip_prefix('M')?.parse::<u64>().ok()?;
            Some((page_id, parse_statements(entity)))
        })
        .collect()
}

/// Labels in `language` from a `wbgetentities&props=labels` response.
pub fn labels_from(response: &EntitiesResponse, language: &str) -> HashMap<String, String> {
    response
        .entities
        .iter()
        .filter(|(_, entity)| entity.missing.is_none())
        .filter_map(|(key, entity)| {
            let label = entity.labels.get(language)?;
            Some((key.clone(), label.value.clone()))
        })
        .collect()
}
