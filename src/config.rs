//! Process configuration, read once from the environment at startup and passed
//! explicitly to whatever needs it.

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` means generation calls fail fast and every tool answers with its
    /// minimal error document.
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
            temperature: 0.7,
            max_output_tokens: 8192,
            port: 8081,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let gemini_api_key = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY"));

        let timeout_secs: u64 = parse_var("GEMINI_TIMEOUT_SECS", get("GEMINI_TIMEOUT_SECS"))?
            .unwrap_or(defaults.request_timeout.as_secs());
        let temperature: f64 = parse_var("GEMINI_TEMPERATURE", get("GEMINI_TEMPERATURE"))?
            .unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                var: "GEMINI_TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }

        Ok(Self {
            gemini_api_key,
            model: get("GEMINI_MODEL").unwrap_or(defaults.model),
            api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            request_timeout: Duration::from_secs(timeout_secs),
            temperature,
            max_output_tokens: parse_var("GEMINI_MAX_OUTPUT_TOKENS", get("GEMINI_MAX_OUTPUT_TOKENS"))?
                .unwrap_or(defaults.max_output_tokens),
            port: parse_var("PORT", get("PORT"))?.unwrap_or(defaults.port),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn parse_var<T>(var: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}
