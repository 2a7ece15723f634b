//! Generative model integration.
//!
//! Only one backend is needed: an OpenAI-compatible chat completion endpoint,
//! used for the optional reply tone pass. `LlmProvider` is the seam tests
//! stub out.

mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use tracing::info;

use crate::config::RefinerConfig;
use crate::error::LlmError;

/// Create an LLM provider from configuration.
pub fn create_provider(config: &RefinerConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = OpenAiProvider::new(
        &config.base_url,
        config.api_key.clone(),
        &config.model,
        config.timeout,
    )?;
    info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_constructs_without_network() {
        // The key is only checked when a request is made.
        let config = RefinerConfig::new("sk-test");
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gpt-4o-mini");
    }
}
