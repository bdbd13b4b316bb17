//! Async orchestration around `MappingSuggestionEngine`.
//!
//! Flow per settled snapshot: plan (under lock) → provider call off the
//! runtime, bounded by a timeout → static fallback on any failure → merge
//! (under lock) → observer notification. Locks are never held across `.await`.

use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use super::engine::{EvaluationPlan, MappingSuggestionEngine};
use super::ollama::OllamaClient;
use super::provider::LlmSuggestionProvider;
use super::static_table::StaticMappingTable;
use super::store::PurgeCounts;
use super::types::{LlmClient, SuggestionObserver, SuggestionProvider, SuggestionRequest};
use super::MappingError;
use crate::config::EngineConfig;
use crate::models::{FormField, MappableItem, Mapping, MappingKey, MappingSuggestion, SuggestionSource};

/// Summary of one settled-snapshot evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub fields_analyzed: usize,
    pub candidates: usize,
    pub added: usize,
    /// `None` when nothing needed a lookup.
    pub source: Option<SuggestionSource>,
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct SuggestionService {
    engine: Arc<RwLock<MappingSuggestionEngine>>,
    provider: Option<Arc<dyn SuggestionProvider>>,
    table: Arc<StaticMappingTable>,
    observers: Vec<Arc<dyn SuggestionObserver>>,
    provider_timeout: Duration,
}

impl SuggestionService {
    pub fn new(provider: Option<Arc<dyn SuggestionProvider>>, provider_timeout: Duration) -> Self {
        Self {
            engine: Arc::new(RwLock::new(MappingSuggestionEngine::new())),
            provider,
            table: Arc::new(StaticMappingTable::builtin().clone()),
            observers: Vec::new(),
            provider_timeout,
        }
    }

    /// Build from configuration: an Ollama-backed provider when a model is
    /// configured and installed, static defaults only otherwise.
    ///
    /// Constructs a blocking HTTP client and queries it, so call it outside
    /// async contexts.
    pub fn from_config(config: &EngineConfig) -> Result<Self, MappingError> {
        let Some(model) = &config.model else {
            tracing::info!("No suggestion provider configured, using static defaults");
            return Ok(Self::new(None, config.provider_timeout));
        };
        let client = OllamaClient::new(&config.ollama_url, config.provider_timeout.as_secs().max(1))?;
        tracing::debug!(url = %client.base_url(), "Checking Ollama for mapping model");
        Ok(Self::with_llm_client(Box::new(client), model, config.provider_timeout))
    }

    /// Use `client` as the provider if it has `model` installed. An
    /// unreachable server or a missing model leaves static defaults only.
    pub fn with_llm_client(
        client: Box<dyn LlmClient + Send + Sync>,
        model: &str,
        provider_timeout: Duration,
    ) -> Self {
        let provider: Option<Arc<dyn SuggestionProvider>> = match client.is_model_available(model) {
            Ok(true) => {
                tracing::info!(model, "Suggestion provider: model confirmed");
                Some(Arc::new(LlmSuggestionProvider::new(client, model)))
            }
            Ok(false) => {
                tracing::warn!(model, "Suggestion provider: model not installed, using static defaults");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Suggestion provider: cannot reach Ollama, using static defaults");
                None
            }
        };
        Self::new(provider, provider_timeout)
    }

    pub fn with_table(mut self, table: StaticMappingTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SuggestionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn engine(&self) -> Result<RwLockWriteGuard<'_, MappingSuggestionEngine>, MappingError> {
        self.engine.write().map_err(|_| MappingError::LockFailed)
    }

    fn read<T>(&self, f: impl FnOnce(&MappingSuggestionEngine) -> T) -> Result<T, MappingError> {
        let engine = self.engine.read().map_err(|_| MappingError::LockFailed)?;
        Ok(f(&engine))
    }

    fn notify_suggestions(&self, suggestions: &[MappingSuggestion]) {
        for observer in &self.observers {
            observer.on_suggestions_changed(suggestions);
        }
    }

    fn notify_analyzing(&self, keys: &[MappingKey]) {
        for observer in &self.observers {
            observer.on_analyzing_keys_changed(keys);
        }
    }

    /// Immediate, non-debounced purge of suggestions for removed fields.
    pub fn observe_fields(&self, fields: &[FormField]) -> Result<(), MappingError> {
        let snapshot = {
            let mut engine = self.engine()?;
            if engine.purge_removed(fields) == 0 {
                return Ok(());
            }
            engine.suggestions().to_vec()
        };
        self.notify_suggestions(&snapshot);
        Ok(())
    }

    /// Fire-and-forget evaluation of a settled snapshot. Must be called
    /// within a tokio runtime.
    pub fn on_fields_settled(&self, fields: Vec<FormField>, confirmed: Vec<Mapping>) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.evaluate(&fields, &confirmed).await {
                tracing::error!(error = %e, "Mapping evaluation failed");
            }
        })
    }

    /// Evaluate a settled snapshot to completion.
    pub async fn evaluate(
        &self,
        fields: &[FormField],
        confirmed: &[Mapping],
    ) -> Result<EvaluationSummary, MappingError> {
        let start = Instant::now();

        let (outcome, suggestions, analyzing) = {
            let mut engine = self.engine()?;
            let before = engine.suggestions().len();
            engine.sync_confirmed(fields, confirmed);
            let outcome = engine.plan(fields);
            let changed = outcome.suggestions_dropped > 0 || engine.suggestions().len() != before;
            let suggestions = changed.then(|| engine.suggestions().to_vec());
            (outcome, suggestions, engine.analyzing_keys())
        };

        if let Some(suggestions) = suggestions {
            self.notify_suggestions(&suggestions);
        }

        let Some(plan) = outcome.plan else {
            return Ok(EvaluationSummary {
                fields_analyzed: outcome.fields_analyzed,
                candidates: 0,
                added: 0,
                source: None,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        };

        self.notify_analyzing(&analyzing);

        let (acquired, source) = self.acquire(&plan).await;

        let (added, suggestions, analyzing) = {
            let mut engine = self.engine()?;
            let added = engine.complete(&plan, acquired);
            (added, engine.suggestions().to_vec(), engine.analyzing_keys())
        };

        self.notify_suggestions(&suggestions);
        self.notify_analyzing(&analyzing);

        let summary = EvaluationSummary {
            fields_analyzed: outcome.fields_analyzed,
            candidates: plan.items.len(),
            added,
            source: Some(source),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            plan_id = %plan.id,
            analyzed = summary.fields_analyzed,
            candidates = summary.candidates,
            added = summary.added,
            source = source.as_str(),
            processing_ms = summary.duration_ms,
            "Mapping evaluation complete"
        );

        Ok(summary)
    }

    /// Ask the provider, falling back to the static table on any failure.
    async fn acquire(&self, plan: &EvaluationPlan) -> (Vec<MappingSuggestion>, SuggestionSource) {
        match self.request_provider(&plan.items).await {
            Ok(suggestions) => (suggestions, SuggestionSource::Provider),
            Err(MappingError::NoProvider) => {
                tracing::debug!(plan_id = %plan.id, "Using static mapping defaults");
                (self.table.suggest(&plan.items), SuggestionSource::StaticFallback)
            }
            Err(e) => {
                if e.is_recoverable() {
                    tracing::warn!(plan_id = %plan.id, error = %e, "Suggestion provider failed, using static defaults");
                } else {
                    tracing::error!(plan_id = %plan.id, error = %e, "Unexpected provider error, using static defaults");
                }
                (self.table.suggest(&plan.items), SuggestionSource::StaticFallback)
            }
        }
    }

    async fn request_provider(
        &self,
        items: &[MappableItem],
    ) -> Result<Vec<MappingSuggestion>, MappingError> {
        let provider = self.provider.clone().ok_or(MappingError::NoProvider)?;
        let request = SuggestionRequest::new(items);

        let call = tokio::task::spawn_blocking(move || provider.suggest(&request));
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(MappingError::TaskFailed(join_err.to_string())),
            Err(_) => Err(MappingError::Timeout(self.provider_timeout.as_secs())),
        }
    }

    pub fn accept_suggestion(&self, key: &MappingKey) -> Result<Option<Mapping>, MappingError> {
        let (mapping, suggestions) = {
            let mut engine = self.engine()?;
            let mapping = engine.accept_suggestion(key);
            (mapping, engine.suggestions().to_vec())
        };
        if mapping.is_some() {
            self.notify_suggestions(&suggestions);
        }
        Ok(mapping)
    }

    pub fn dismiss_suggestion(&self, key: &MappingKey) -> Result<(), MappingError> {
        let (removed, suggestions) = {
            let mut engine = self.engine()?;
            let before = engine.suggestions().len();
            engine.dismiss_suggestion(key);
            (engine.suggestions().len() != before, engine.suggestions().to_vec())
        };
        if removed {
            self.notify_suggestions(&suggestions);
        }
        Ok(())
    }

    pub fn remove_field(&self, field_id: &str) -> Result<PurgeCounts, MappingError> {
        let (counts, suggestions, analyzing) = {
            let mut engine = self.engine()?;
            let counts = engine.remove_field(field_id);
            (counts, engine.suggestions().to_vec(), engine.analyzing_keys())
        };
        if counts.suggestions > 0 {
            self.notify_suggestions(&suggestions);
        }
        self.notify_analyzing(&analyzing);
        Ok(counts)
    }

    pub fn confirm_mapping(
        &self,
        field_id: &str,
        sub_field_key: Option<&str>,
        ehr_path: &str,
    ) -> Result<Mapping, MappingError> {
        let (mapping, suggestions) = {
            let mut engine = self.engine()?;
            let mapping = engine.confirm_mapping(field_id, sub_field_key, ehr_path)?;
            (mapping, engine.suggestions().to_vec())
        };
        self.notify_suggestions(&suggestions);
        Ok(mapping)
    }

    pub fn remove_mapping(&self, key: &MappingKey) -> Result<Option<Mapping>, MappingError> {
        Ok(self.engine()?.remove_mapping(key))
    }

    pub fn suggestions(&self) -> Result<Vec<MappingSuggestion>, MappingError> {
        self.read(|e| e.suggestions().to_vec())
    }

    pub fn confirmed(&self) -> Result<Vec<Mapping>, MappingError> {
        self.read(MappingSuggestionEngine::confirmed)
    }

    pub fn dismissed(&self) -> Result<Vec<MappingKey>, MappingError> {
        self.read(MappingSuggestionEngine::dismissed)
    }

    pub fn analyzing_keys(&self) -> Result<Vec<MappingKey>, MappingError> {
        self.read(MappingSuggestionEngine::analyzing_keys)
    }
}
