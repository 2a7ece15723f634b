//! Configuration types.
//!
//! Everything is read from the environment. Unset or unparsable values fall
//! back to the defaults below; the only switch with behavioral weight is
//! `OPENAI_API_KEY`, whose absence disables reply refinement entirely.

use std::time::Duration;

use secrecy::SecretString;

/// Primary zero-shot model.
pub const DEFAULT_ZSL_MODEL: &str = "facebook/bart-large-mnli";

/// Model tried when the primary fails to load.
pub const DEFAULT_ZSL_MODEL_FALLBACK: &str = "typeform/distilbert-base-uncased-mnli";

/// Hosted inference base URL; the model id is appended as a path segment.
pub const DEFAULT_HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest input handed to the core; callers truncate beyond this.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 20_000;

/// Zero-shot classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Model identifier tried first.
    pub primary_model: String,
    /// Model identifier tried when the primary fails.
    pub fallback_model: String,
    /// Inference endpoint base URL.
    pub endpoint: String,
    /// Optional bearer token for the inference endpoint.
    pub api_token: Option<SecretString>,
    /// Per-request timeout (covers cold model starts on the hosted side).
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            primary_model: DEFAULT_ZSL_MODEL.to_string(),
            fallback_model: DEFAULT_ZSL_MODEL_FALLBACK.to_string(),
            endpoint: DEFAULT_HF_INFERENCE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClassifierConfig {
    /// Build from `ZSL_MODEL`, `ZSL_MODEL_FALLBACK`, `HF_INFERENCE_URL`,
    /// `HF_API_TOKEN` and `ZSL_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let primary_model = non_empty_var("ZSL_MODEL").unwrap_or(defaults.primary_model);
        let fallback_model =
            non_empty_var("ZSL_MODEL_FALLBACK").unwrap_or(defaults.fallback_model);
        let endpoint = non_empty_var("HF_INFERENCE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.endpoint);
        let api_token = non_empty_var("HF_API_TOKEN").map(SecretString::from);

        let timeout = std::env::var("ZSL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            primary_model,
            fallback_model,
            endpoint,
            api_token,
            timeout,
        }
    }
}

/// Reply refinement configuration. Only exists when an API key is set.
#[derive(Debug, Clone)]
pub struct RefinerConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    /// Upper bound on a single refinement call; exceeding it is a failure.
    pub timeout: Duration,
    pub temperature: f32,
}

impl RefinerConfig {
    /// Build a config around an API key, with every other field defaulted.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(20),
            temperature: 0.3,
        }
    }

    /// Build from `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL` and
    /// `REFINE_TIMEOUT_SECS`. Returns `None` when no key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("OPENAI_API_KEY")?;
        let mut config = Self::new(api_key);

        if let Some(model) = non_empty_var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(url) = non_empty_var("OPENAI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = std::env::var("REFINE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        Some(config)
    }
}

/// Caller-side input limits.
pub fn max_text_chars_from_env() -> usize {
    std::env::var("MAX_TEXT_CHARS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_MAX_TEXT_CHARS)
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
