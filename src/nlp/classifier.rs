//! Zero-shot classifier adapter.
//!
//! `ZeroShotClassifier` is the label-scoring seam; `ClassifierHandle` owns the
//! one-time, process-wide model initialization (primary id, then fallback).
//! The handle is injected into `EmailClassifier` rather than living in a
//! global, so tests substitute a scripted classifier through
//! `ClassifierLoader`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::ClassifierError;

/// Labels ranked by descending score, with a parallel score vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLabels {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl ScoredLabels {
    /// Build from unordered `(label, score)` pairs.
    ///
    /// Scores are clamped to [0, 1], renormalized to sum to 1 (single-label
    /// mode), then sorted descending. Ties keep their input order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, f32)>) -> Self {
        let mut pairs: Vec<(String, f32)> = pairs
            .into_iter()
            .map(|(label, score)| {
                let score = if score.is_finite() {
                    score.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (label, score)
            })
            .collect();

        let total: f32 = pairs.iter().map(|(_, s)| s).sum();
        if total > 0.0 {
            for (_, score) in &mut pairs {
                *score = (*score / total).clamp(0.0, 1.0);
            }
        }

        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (labels, scores) = pairs.into_iter().unzip();
        Self { labels, scores }
    }

    /// Highest-scoring label and its score.
    pub fn top(&self) -> Option<(&str, f32)> {
        let label = self.labels.first()?;
        let score = *self.scores.first()?;
        Some((label.as_str(), score))
    }
}

/// A loaded zero-shot model that scores text against candidate labels.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Identifier of the model actually serving requests.
    fn model_id(&self) -> &str;

    /// Score `text` against `labels` in single-label mode.
    async fn score(&self, text: &str, labels: &[&str]) -> Result<ScoredLabels, ClassifierError>;
}

/// Turns a model identifier into a ready classifier.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ZeroShotClassifier>, ClassifierError>;
}

/// Lazily-initialized shared classifier.
///
/// The first `get()` loads the primary model, falling back to the secondary
/// on any failure. Concurrent first callers wait for that single load. The
/// outcome is kept for the life of the handle: after a failed
/// initialization every `get()` returns the same error.
pub struct ClassifierHandle {
    loader: Arc<dyn ClassifierLoader>,
    primary: String,
    fallback: String,
    cell: OnceCell<Result<Arc<dyn ZeroShotClassifier>, ClassifierError>>,
}

impl ClassifierHandle {
    pub fn new(
        loader: Arc<dyn ClassifierLoader>,
        primary: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            primary: primary.into(),
            fallback: fallback.into(),
            cell: OnceCell::new(),
        }
    }

    /// Wrap an already-loaded classifier (no loading happens).
    pub fn preloaded(classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        let model = classifier.model_id().to_string();
        Self {
            loader: Arc::new(PreloadedLoader(Arc::clone(&classifier))),
            primary: model.clone(),
            fallback: model,
            cell: OnceCell::new_with(Some(Ok(classifier))),
        }
    }

    /// Get the shared classifier, initializing it on first use.
    pub async fn get(&self) -> Result<Arc<dyn ZeroShotClassifier>, ClassifierError> {
        self.cell.get_or_init(|| self.initialize()).await.clone()
    }

    /// Whether initialization has already run (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn initialize(&self) -> Result<Arc<dyn ZeroShotClassifier>, ClassifierError> {
        info!(model = %self.primary, "Loading zero-shot classifier");
        let primary_err = match self.loader.load(&self.primary).await {
            Ok(classifier) => {
                info!(model = %classifier.model_id(), "Zero-shot classifier ready");
                return Ok(classifier);
            }
            Err(e) => e,
        };

        warn!(
            model = %self.primary,
            fallback = %self.fallback,
            error = %primary_err,
            "Primary model failed to load, trying fallback"
        );

        match self.loader.load(&self.fallback).await {
            Ok(classifier) => {
                info!(model = %classifier.model_id(), "Fallback zero-shot classifier ready");
                Ok(classifier)
            }
            Err(fallback_err) => Err(ClassifierError::ModelUnavailable {
                primary: self.primary.clone(),
                fallback: self.fallback.clone(),
                reason: format!("primary: {primary_err}; fallback: {fallback_err}"),
            }),
        }
    }
}

struct PreloadedLoader(Arc<dyn ZeroShotClassifier>);

#[async_trait]
impl ClassifierLoader for PreloadedLoader {
    async fn load(&self, _model_id: &str) -> Result<Arc<dyn ZeroShotClassifier>, ClassifierError> {
        Ok(Arc::clone(&self.0))
    }
}
