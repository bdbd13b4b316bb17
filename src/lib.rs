//! Formbridge — EHR field-mapping suggestions for a clinical form builder.
//!
//! The form builder feeds field-list snapshots in; the engine keeps a set of
//! suggested links from form fields (and composite sub-items) to EHR paths,
//! consistent with the user's confirmed mappings and dismissals.

pub mod config;
pub mod models; // Form fields, EHR catalog, mappings
pub mod mapping; // Suggestion engine, providers, debounce

use tracing_subscriber::EnvFilter;

pub use config::EngineConfig;
pub use mapping::{
    MappingError, MappingSuggestionEngine, SettleScheduler, SuggestionObserver, SuggestionProvider,
    SuggestionService,
};

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    if result.is_ok() {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
