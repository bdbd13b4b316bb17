use serde::{Deserialize, Serialize};

use super::MappingError;
use crate::models::ehr;
use crate::models::{MappableItem, MappingKey, MappingSuggestion};

/// One field description sent to a suggestion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    pub field_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field_key: Option<String>,
    pub label: String,
}

impl RequestItem {
    pub fn key(&self) -> MappingKey {
        MappingKey::new(&self.field_id, self.sub_field_key.as_deref())
    }
}

impl From<&MappableItem> for RequestItem {
    fn from(item: &MappableItem) -> Self {
        Self {
            field_id: item.field_id.clone(),
            sub_field_key: item.sub_field_key.clone(),
            label: item.label.clone(),
        }
    }
}

/// Catalog context handed to the provider alongside the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub label: &'static str,
    pub category: &'static str,
    pub path: &'static str,
}

/// Ordered candidate fields plus the full EHR path catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionRequest {
    pub items: Vec<RequestItem>,
    pub catalog: Vec<CatalogEntry>,
}

impl SuggestionRequest {
    pub fn new(items: &[MappableItem]) -> Self {
        Self {
            items: items.iter().map(RequestItem::from).collect(),
            catalog: ehr::catalog()
                .iter()
                .map(|p| CatalogEntry {
                    label: p.label,
                    category: p.category.as_str(),
                    path: p.path,
                })
                .collect(),
        }
    }

    pub fn contains_key(&self, key: &MappingKey) -> bool {
        self.items.iter().any(|item| &item.key() == key)
    }
}

/// External source of mapping suggestions (AI service or similar).
/// Blocking by contract; the service runs it off the async runtime.
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<MappingSuggestion>, MappingError>;
}

/// Ollama LLM client abstraction (allows mocking)
pub trait LlmClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, MappingError>;

    /// Whether `model` (or a tagged variant of it) is installed.
    fn is_model_available(&self, model: &str) -> Result<bool, MappingError>;
}

/// Presentation callbacks fired when engine outputs change.
pub trait SuggestionObserver: Send + Sync {
    fn on_suggestions_changed(&self, suggestions: &[MappingSuggestion]);

    fn on_analyzing_keys_changed(&self, keys: &[MappingKey]);
}
