use super::types::SuggestionRequest;

pub const MAPPING_SYSTEM_PROMPT: &str = r#"
You are a clinical data-mapping assistant. Your ONLY role is to link intake
form fields to locations in an electronic health record (EHR) schema.

RULES:
1. Use ONLY paths that appear in the provided EHR catalog, copied verbatim.
2. Suggest at most one path per field. Skip fields with no sensible match.
3. Echo fieldId and subFieldKey exactly as given.
4. Give a short, one-sentence reason for each suggestion.
5. Output MUST be a single JSON array wrapped in ```json``` fences and nothing else.
"#;

/// Build the mapping prompt for a batch of candidate fields.
pub fn build_mapping_prompt(request: &SuggestionRequest) -> String {
    let catalog = request
        .catalog
        .iter()
        .map(|entry| format!("- {} [{}]: {}", entry.path, entry.category, entry.label))
        .collect::<Vec<_>>()
        .join("\n");

    let fields = request
        .items
        .iter()
        .map(|item| {
            let sub = item
                .sub_field_key
                .as_deref()
                .map(|s| format!(", subFieldKey: \"{s}\""))
                .unwrap_or_default();
            format!("- fieldId: \"{}\"{sub}, label: \"{}\"", item.field_id, item.label)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<ehr_catalog>
{catalog}
</ehr_catalog>

<form_fields>
{fields}
</form_fields>

Suggest the best EHR path for each form field above using this JSON structure:

```json
[
  {{
    "fieldId": "id exactly as given",
    "subFieldKey": "sub-field key exactly as given, omit if absent",
    "ehrPath": "path from the catalog",
    "reason": "one sentence"
  }}
]
```"#
    )
}
