//! Error types for the triage core.
//!
//! Every internal boundary returns one of these. The two public entry points
//! (`EmailClassifier::classify_email` and `Responder::suggest_reply`) match
//! them into sentinel or fallback output, so none of these reach a caller of
//! the core directly.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Zero-shot classifier errors.
///
/// `Clone` so a failed one-time initialization can be cached and handed to
/// every later caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    #[error("No zero-shot model could be loaded (primary: {primary}, fallback: {fallback}): {reason}")]
    ModelUnavailable {
        primary: String,
        fallback: String,
        reason: String,
    },

    #[error("Failed to load model {model}: {reason}")]
    LoadFailed { model: String, reason: String },

    #[error("Inference request to {model} failed: {reason}")]
    RequestFailed { model: String, reason: String },

    #[error("Invalid response from {model}: {reason}")]
    InvalidResponse { model: String, reason: String },

    #[error("Inference request to {model} timed out after {timeout:?}")]
    Timeout { model: String, timeout: Duration },
}

/// Generative provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reply template fill errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Template references unknown placeholder {{{0}}}")]
    MissingKey(String),

    #[error("Unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
