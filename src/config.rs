use std::time::Duration;

use crate::mapping::MappingError;

/// Application-level constants
pub const APP_NAME: &str = "Formbridge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quiet period after the last edit before a snapshot counts as settled.
pub const DEFAULT_SETTLE_MS: u64 = 1000;

/// Upper bound on a single provider call before falling back.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "medgemma";

/// Tracing filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "warn,formbridge_lib=info"
}

/// Runtime settings for the suggestion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub settle_delay: Duration,
    pub provider_timeout: Duration,
    pub ollama_url: String,
    /// `None` disables the external provider; only static defaults are used.
    pub model: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: Some(DEFAULT_MODEL.to_string()),
        }
    }
}

impl EngineConfig {
    /// Read overrides from `FORMBRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self, MappingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (testable without touching the process env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MappingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = lookup("FORMBRIDGE_SETTLE_MS") {
            config.settle_delay = Duration::from_millis(parse_number("FORMBRIDGE_SETTLE_MS", &ms)?);
        }
        if let Some(secs) = lookup("FORMBRIDGE_PROVIDER_TIMEOUT_SECS") {
            let secs = parse_number("FORMBRIDGE_PROVIDER_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(MappingError::Config(
                    "FORMBRIDGE_PROVIDER_TIMEOUT_SECS must be positive".into(),
                ));
            }
            config.provider_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = lookup("FORMBRIDGE_OLLAMA_URL") {
            let url = url.trim();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(MappingError::Config(format!(
                    "FORMBRIDGE_OLLAMA_URL must be an http(s) URL, got {url:?}"
                )));
            }
            config.ollama_url = url.to_string();
        }
        if let Some(model) = lookup("FORMBRIDGE_MODEL") {
            let model = model.trim();
            config.model = match model {
                "" | "none" => None,
                m => Some(m.to_string()),
            };
        }
        if let Some(provider) = lookup("FORMBRIDGE_PROVIDER") {
            if matches!(provider.trim(), "off" | "false" | "0") {
                config.model = None;
            }
        }

        Ok(config)
    }

    pub fn provider_enabled(&self) -> bool {
        self.model.is_some()
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, MappingError> {
    value
        .trim()
        .parse()
        .map_err(|_| MappingError::Config(format!("{name} must be a whole number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_constants() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.settle_delay, Duration::from_millis(1000));
        assert!(config.provider_enabled());
    }

    #[test]
    fn overrides_are_applied() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FORMBRIDGE_SETTLE_MS", "250"),
            ("FORMBRIDGE_PROVIDER_TIMEOUT_SECS", "5"),
            ("FORMBRIDGE_OLLAMA_URL", "http://gpu-box:11434"),
            ("FORMBRIDGE_MODEL", "medgemma:4b"),
        ]))
        .unwrap();
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.provider_timeout, Duration::from_secs(5));
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model.as_deref(), Some("medgemma:4b"));
    }

    #[test]
    fn provider_can_be_disabled() {
        let config = EngineConfig::from_lookup(lookup(&[("FORMBRIDGE_PROVIDER", "off")])).unwrap();
        assert!(!config.provider_enabled());

        let config = EngineConfig::from_lookup(lookup(&[("FORMBRIDGE_MODEL", "none")])).unwrap();
        assert!(!config.provider_enabled());
    }

    #[test]
    fn invalid_number_is_config_error() {
        let err = EngineConfig::from_lookup(lookup(&[("FORMBRIDGE_SETTLE_MS", "soon")])).unwrap_err();
        assert!(matches!(err, MappingError::Config(_)));
        assert!(err.to_string().contains("FORMBRIDGE_SETTLE_MS"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result =
            EngineConfig::from_lookup(lookup(&[("FORMBRIDGE_PROVIDER_TIMEOUT_SECS", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn non_http_url_is_rejected() {
        let result = EngineConfig::from_lookup(lookup(&[("FORMBRIDGE_OLLAMA_URL", "localhost")]));
        assert!(result.is_err());
    }

    #[test]
    fn app_name_is_formbridge() {
        assert_eq!(APP_NAME, "Formbridge");
    }
}
