//! Classify-then-reply in one call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ClassifierConfig, RefinerConfig};
use crate::error::Result;
use crate::llm::create_provider;
use crate::nlp::hf::HfInferenceLoader;
use crate::nlp::labels::{Category, Intent};
use crate::nlp::{ClassificationResult, ClassifierHandle, EmailClassifier, OverrideEngine};
use crate::reply::{ReplyContext, ReplyRefiner, ReplySource, Responder};

/// Combined classification and reply for one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub category: Category,
    pub category_score: f32,
    pub intent: Intent,
    pub intent_score: f32,
    pub suggested_reply: String,
    pub reply_source: ReplySource,
}

pub struct EmailAssistant {
    classifier: EmailClassifier,
    responder: Responder,
}

impl EmailAssistant {
    pub fn new(classifier: EmailClassifier, responder: Responder) -> Self {
        Self {
            classifier,
            responder,
        }
    }

    /// Hosted zero-shot backend plus, when `OPENAI_API_KEY` is set, reply
    /// refinement.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClassifierConfig::from_env(), RefinerConfig::from_env().as_ref())
    }

    pub fn from_config(
        classifier: &ClassifierConfig,
        refiner: Option<&RefinerConfig>,
    ) -> Result<Self> {
        let loader = HfInferenceLoader::new(classifier)?;
        let handle = ClassifierHandle::new(
            Arc::new(loader),
            &classifier.primary_model,
            &classifier.fallback_model,
        );
        let classifier = EmailClassifier::new(Arc::new(handle), OverrideEngine::default_rules());

        let responder = match refiner {
            Some(config) => {
                let llm = create_provider(config)?;
                Responder::with_refiner(ReplyRefiner::new(llm, config))
            }
            None => {
                info!("OPENAI_API_KEY not set, replies are template-only");
                Responder::new()
            }
        };

        Ok(Self::new(classifier, responder))
    }

    pub fn classifier(&self) -> &EmailClassifier {
        &self.classifier
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Classify `text` and suggest a reply for it. Never fails; a failed
    /// classification yields the "Erro" result and a generic reply.
    pub async fn process(&self, text: &str, ctx: &ReplyContext) -> ProcessOutcome {
        let ClassificationResult {
            category,
            category_score,
            intent,
            intent_score,
            ..
        } = self.classifier.classify_email(text).await;

        let reply = self
            .responder
            .suggest_reply(category.label(), intent.label(), ctx)
            .await;

        ProcessOutcome {
            category,
            category_score,
            intent,
            intent_score,
            suggested_reply: reply.reply,
            reply_source: reply.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_label_strings() {
        let outcome = ProcessOutcome {
            category: Category::Unproductive,
            category_score: 0.8,
            intent: Intent::Gratitude,
            intent_score: 0.7,
            suggested_reply: "Obrigado!".into(),
            reply_source: ReplySource::Template,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["category"], "Improdutivo");
        assert_eq!(json["intent"], "Agradecimento ou felicitação");
        assert_eq!(json["reply_source"], "template");
        assert_eq!(json["suggested_reply"], "Obrigado!");
    }

    #[test]
    fn from_config_without_refiner_is_template_only() {
        let assistant = EmailAssistant::from_config(&ClassifierConfig::default(), None).unwrap();
        assert!(!assistant.responder().refines());
        assert!(!assistant.classifier().handle().is_initialized());
    }

    #[test]
    fn from_config_with_refiner_enables_refinement() {
        let refiner = RefinerConfig::new("sk-test");
        let assistant =
            EmailAssistant::from_config(&ClassifierConfig::default(), Some(&refiner)).unwrap();
        assert!(assistant.responder().refines());
    }
}
