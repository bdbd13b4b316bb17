use std::collections::HashSet;

use serde::Deserialize;

use super::types::SuggestionRequest;
use super::MappingError;
use crate::models::{ehr, MappingKey, MappingSuggestion, SuggestionSource};

/// Parse a provider's raw text into validated suggestions for `request`.
///
/// Items that do not deserialize, name a path outside the catalog, or name a
/// field the request did not ask about are skipped. A response with no JSON
/// array at all is an error.
pub fn parse_suggestion_response(
    response: &str,
    request: &SuggestionRequest,
) -> Result<Vec<MappingSuggestion>, MappingError> {
    let json_str = extract_json(response)?;
    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| MappingError::JsonParsing(e.to_string()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("suggestions") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(MappingError::MalformedResponse(
                    "Object without a suggestions array".into(),
                ))
            }
        },
        _ => {
            return Err(MappingError::MalformedResponse(
                "Expected a JSON array of suggestions".into(),
            ))
        }
    };

    Ok(validate_suggestions(parse_array_lenient(&items), request))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSuggestion {
    field_id: String,
    #[serde(default)]
    sub_field_key: Option<String>,
    ehr_path: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Locate the JSON payload: a ```json fence if present, otherwise the
/// outermost bracketed span of the response.
fn extract_json(response: &str) -> Result<&str, MappingError> {
    if let Some(fence_start) = response.find("```json") {
        let content_start = fence_start + 7;
        let fence_len = response[content_start..]
            .find("```")
            .ok_or_else(|| MappingError::MalformedResponse("Unclosed JSON block".into()))?;
        return Ok(response[content_start..content_start + fence_len].trim());
    }

    let trimmed = response.trim();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if end > start => Ok(&trimmed[start..=end]),
        _ => Err(MappingError::MalformedResponse("No JSON found".into())),
    }
}

/// Parse an array leniently — skip items that fail to deserialize.
fn parse_array_lenient(items: &[serde_json::Value]) -> Vec<RawSuggestion> {
    items
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect()
}

fn validate_suggestions(
    raw: Vec<RawSuggestion>,
    request: &SuggestionRequest,
) -> Vec<MappingSuggestion> {
    let mut seen: HashSet<MappingKey> = HashSet::new();
    let mut accepted = Vec::new();

    for item in raw {
        // Providers sometimes emit "" for absent sub keys
        let sub_field_key = item.sub_field_key.filter(|s| !s.trim().is_empty());
        let key = MappingKey::new(&item.field_id, sub_field_key.as_deref());

        if !request.contains_key(&key) {
            tracing::debug!(key = %key, "Provider suggested a field outside the request, skipping");
            continue;
        }
        if !ehr::is_known(&item.ehr_path) {
            tracing::debug!(key = %key, path = %item.ehr_path, "Provider suggested unknown EHR path, skipping");
            continue;
        }
        if !seen.insert(key) {
            continue;
        }

        accepted.push(MappingSuggestion {
            field_id: item.field_id,
            sub_field_key,
            ehr_path: item.ehr_path,
            reason: item.reason.unwrap_or_default(),
            source: SuggestionSource::Provider,
        });
    }

    accepted
}
