//! Optional tone pass over a filled template.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::RefinerConfig;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Rewrites a filled reply through a chat model.
pub struct ReplyRefiner {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
    temperature: f32,
}

impl ReplyRefiner {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &RefinerConfig) -> Self {
        Self {
            llm,
            timeout: config.timeout,
            temperature: config.temperature,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// One attempt, bounded by the configured timeout. Blank output is an error.
    pub async fn refine(&self, filled: &str) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(build_prompt(filled))])
            .with_temperature(self.temperature);

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.timeout,
            })??;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: "empty completion".into(),
            });
        }

        debug!(
            model = self.llm.model_name(),
            output_tokens = response.output_tokens,
            "Reply refined"
        );
        Ok(text.to_string())
    }
}

fn build_prompt(filled: &str) -> String {
    format!(
        "Revise e melhore a mensagem abaixo com tom profissional e claro, mantendo o conteúdo.\n\n\
         Mensagem:\n{filled}\n\n\
         Saída final apenas com o texto revisado."
    )
}
