//! Classification orchestrator.
//!
//! Flow:
//! 1. Normalize (stopwords out) for the model
//! 2. Zero-shot category query, then intent query
//! 3. Override cascade over the original text
//!
//! `classify_email` never fails: any classifier error becomes the "Erro"
//! sentinel result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::ClassifierError;
use crate::nlp::classifier::ClassifierHandle;
use crate::nlp::labels::{Category, Intent, LabelSet};
use crate::nlp::normalize::normalize;
use crate::nlp::rules::{OverrideEngine, Verdict};

/// Final classification for one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    /// Model confidence for the category query, before overrides.
    pub category_score: f32,
    pub intent: Intent,
    /// Model confidence for the intent query, before overrides.
    pub intent_score: f32,
    /// Stopword-filtered text the model saw.
    #[serde(rename = "processed")]
    pub processed_text: String,
}

impl ClassificationResult {
    /// The "always respond" sentinel for a failed classification.
    pub fn error_sentinel() -> Self {
        Self {
            category: Category::Error,
            category_score: 0.0,
            intent: Intent::ProcessingError,
            intent_score: 0.0,
            processed_text: String::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == Category::Error
    }
}

/// Zero-shot classification plus keyword overrides.
pub struct EmailClassifier {
    handle: Arc<ClassifierHandle>,
    overrides: OverrideEngine,
    category_labels: LabelSet,
    intent_labels: LabelSet,
}

impl EmailClassifier {
    pub fn new(handle: Arc<ClassifierHandle>, overrides: OverrideEngine) -> Self {
        Self {
            handle,
            overrides,
            category_labels: LabelSet::categories(),
            intent_labels: LabelSet::intents(),
        }
    }

    /// Shared classifier handle (e.g. to warm it up at startup).
    pub fn handle(&self) -> &Arc<ClassifierHandle> {
        &self.handle
    }

    /// Classify an email. Always returns a structurally valid result.
    pub async fn classify_email(&self, text: &str) -> ClassificationResult {
        match self.try_classify(text).await {
            Ok(result) => {
                info!(
                    category = %result.category,
                    intent = %result.intent,
                    category_score = result.category_score,
                    intent_score = result.intent_score,
                    "Email classified"
                );
                result
            }
            Err(e) => {
                error!(error = %e, "Classification failed, returning error sentinel");
                ClassificationResult::error_sentinel()
            }
        }
    }

    async fn try_classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        let classifier = self.handle.get().await?;
        let processed = normalize(text);

        let categories = classifier
            .score(&processed, self.category_labels.as_slice())
            .await?;
        let (raw_category, category_score) =
            categories.top().ok_or_else(|| ClassifierError::InvalidResponse {
                model: classifier.model_id().to_string(),
                reason: "empty category ranking".into(),
            })?;
        let category = Category::from_model_label(raw_category);

        let intents = classifier
            .score(&processed, self.intent_labels.as_slice())
            .await?;
        let (raw_intent, intent_score) =
            intents.top().ok_or_else(|| ClassifierError::InvalidResponse {
                model: classifier.model_id().to_string(),
                reason: "empty intent ranking".into(),
            })?;
        let intent =
            Intent::from_label(raw_intent).ok_or_else(|| ClassifierError::InvalidResponse {
                model: classifier.model_id().to_string(),
                reason: format!("label '{raw_intent}' is not a candidate intent"),
            })?;

        debug!(
            model = %classifier.model_id(),
            category = %category,
            intent = %intent,
            "Model verdict before overrides"
        );

        let verdict = self.overrides.apply(text, Verdict::new(category, intent));

        Ok(ClassificationResult {
            category: verdict.category,
            category_score,
            intent: verdict.intent,
            intent_score,
            processed_text: processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::nlp::classifier::{ScoredLabels, ZeroShotClassifier};
    use crate::nlp::labels::{CATEGORY_ACTIONABLE_LABEL, CATEGORY_NON_ACTIONABLE_LABEL};

    /// Ranks one fixed label first in whichever set it belongs to.
    struct FixedClassifier {
        category: &'static str,
        intent: Intent,
    }

    #[async_trait]
    impl ZeroShotClassifier for FixedClassifier {
        fn model_id(&self) -> &str {
            "fixed"
        }

        async fn score(
            &self,
            _text: &str,
            labels: &[&str],
        ) -> Result<ScoredLabels, ClassifierError> {
            let winner = if labels.contains(&self.category) {
                self.category
            } else {
                self.intent.label()
            };
            let rest = (labels.len() as f32 - 1.0).max(1.0);
            Ok(ScoredLabels::from_pairs(labels.iter().map(|l| {
                let score = if *l == winner { 0.8 } else { 0.2 / rest };
                (l.to_string(), score)
            })))
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl ZeroShotClassifier for BrokenClassifier {
        fn model_id(&self) -> &str {
            "broken"
        }

        async fn score(
            &self,
            _text: &str,
            _labels: &[&str],
        ) -> Result<ScoredLabels, ClassifierError> {
            Err(ClassifierError::RequestFailed {
                model: "broken".into(),
                reason: "boom".into(),
            })
        }
    }

    fn classifier_with(category: &'static str, intent: Intent) -> EmailClassifier {
        let handle = ClassifierHandle::preloaded(Arc::new(FixedClassifier { category, intent }));
        EmailClassifier::new(Arc::new(handle), OverrideEngine::default_rules())
    }

    #[tokio::test]
    async fn model_verdict_without_triggers() {
        let classifier = classifier_with(CATEGORY_ACTIONABLE_LABEL, Intent::TechnicalSupport);
        let result = classifier
            .classify_email("Não consigo acessar o sistema, aparece erro 500.")
            .await;
        assert_eq!(result.category, Category::Productive);
        assert_eq!(result.intent, Intent::TechnicalSupport);
        assert!((result.category_score - 0.8).abs() < 1e-5);
        assert!((result.intent_score - 0.8).abs() < 1e-5);
        assert_eq!(result.processed_text, "consigo acessar sistema, aparece erro 500.");
    }

    #[tokio::test]
    async fn overrides_keep_model_scores() {
        let classifier = classifier_with(CATEGORY_ACTIONABLE_LABEL, Intent::InformationRequest);
        let result = classifier
            .classify_email("Promoção de 12 computadores por 1 LEVANDO SO HOJE!")
            .await;
        assert_eq!(result.category, Category::Unproductive);
        assert_eq!(result.intent, Intent::SpamMarketing);
        assert!((result.category_score - 0.8).abs() < 1e-5);
        assert!((result.intent_score - 0.8).abs() < 1e-5);
    }

    #[tokio::test]
    async fn non_actionable_category_label_maps_to_unproductive() {
        let classifier = classifier_with(CATEGORY_NON_ACTIONABLE_LABEL, Intent::SmallTalk);
        let result = classifier.classify_email("Bom dia pessoal, ótimo fim de semana").await;
        assert_eq!(result.category, Category::Unproductive);
        assert_eq!(result.intent, Intent::SmallTalk);
    }

    #[tokio::test]
    async fn classifier_error_yields_sentinel() {
        let handle = ClassifierHandle::preloaded(Arc::new(BrokenClassifier));
        let classifier = EmailClassifier::new(Arc::new(handle), OverrideEngine::default_rules());
        let result = classifier.classify_email("Qual o status do chamado?").await;
        assert_eq!(result, ClassificationResult::error_sentinel());
        assert!(result.is_error());
        assert_eq!(result.intent.label(), "Erro no processamento");
    }

    #[test]
    fn result_serializes_with_original_keys() {
        let result = ClassificationResult {
            category: Category::Productive,
            category_score: 0.9,
            intent: Intent::StatusRequest,
            intent_score: 0.7,
            processed_text: "status pedido".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["category"], "Produtivo");
        assert_eq!(json["intent"], "Solicitação de status ou acompanhamento");
        assert_eq!(json["processed"], "status pedido");
    }
}
