//! LLM-backed suggestion provider: prompt → generate → lenient parse.

use super::parser::parse_suggestion_response;
use super::prompt::{build_mapping_prompt, MAPPING_SYSTEM_PROMPT};
use super::types::{LlmClient, SuggestionProvider, SuggestionRequest};
use super::MappingError;
use crate::models::MappingSuggestion;

pub struct LlmSuggestionProvider {
    llm: Box<dyn LlmClient + Send + Sync>,
    model_name: String,
}

impl LlmSuggestionProvider {
    pub fn new(llm: Box<dyn LlmClient + Send + Sync>, model_name: &str) -> Self {
        Self {
            llm,
            model_name: model_name.to_string(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl SuggestionProvider for LlmSuggestionProvider {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<MappingSuggestion>, MappingError> {
        if request.items.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = build_mapping_prompt(request);
        let response = self
            .llm
            .generate(&self.model_name, &prompt, MAPPING_SYSTEM_PROMPT)?;

        let suggestions = parse_suggestion_response(&response, request)?;

        tracing::debug!(
            model = %self.model_name,
            requested = request.items.len(),
            returned = suggestions.len(),
            "Provider suggestions parsed"
        );

        Ok(suggestions)
    }
}
