pub mod types;
pub mod static_table;
pub mod prompt;
pub mod parser;
pub mod ollama;
pub mod provider;
pub mod store;
pub mod engine;
pub mod service;
pub mod debounce;

pub use types::*;
pub use static_table::*;
pub use prompt::*;
pub use parser::*;
pub use ollama::*;
pub use provider::*;
pub use store::*;
pub use engine::*;
pub use service::*;
pub use debounce::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Suggestion provider is not reachable at {0}")]
    ProviderUnavailable(String),

    #[error("Suggestion provider returned error (status {status}): {body}")]
    ProviderError { status: u16, body: String },

    #[error("No suggestion provider configured")]
    NoProvider,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Provider call timed out after {0}s")]
    Timeout(u64),

    #[error("Provider task failed: {0}")]
    TaskFailed(String),

    #[error("Unknown EHR path: {0}")]
    UnknownEhrPath(String),

    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine state lock poisoned")]
    LockFailed,
}

impl MappingError {
    /// Errors that mean "no usable provider output"; the caller falls back
    /// to the static table instead of surfacing them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Config(_) | Self::LockFailed | Self::InvalidEnum { .. } | Self::UnknownEhrPath(_)
        )
    }
}
