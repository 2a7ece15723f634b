//! Hosted zero-shot backend (Hugging Face inference API).
//!
//! `POST {endpoint}/{model}` with the candidate labels as parameters. Two
//! response shapes are in the wild and both are accepted:
//! `{"sequence", "labels", "scores"}` and `[{"label", "score"}, ...]`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClassifierConfig;
use crate::error::{ClassifierError, ConfigError};
use crate::nlp::classifier::{ClassifierLoader, ScoredLabels, ZeroShotClassifier};

/// Text and labels used to check that a model is actually being served.
const WARMUP_TEXT: &str = "Mensagem de teste";
const WARMUP_LABELS: [&str; 2] = ["teste", "outro"];

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [&'a str],
    multi_label: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns { labels: Vec<String>, scores: Vec<f32> },
    Rows(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Zero-shot classifier backed by the hosted inference API.
pub struct HfInferenceClassifier {
    client: reqwest::Client,
    url: String,
    model_id: String,
    token: Option<SecretString>,
    timeout: Duration,
}

impl HfInferenceClassifier {
    pub fn new(
        client: reqwest::Client,
        endpoint: &str,
        model_id: &str,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model_id),
            model_id: model_id.to_string(),
            token,
            timeout,
        }
    }

    fn request_failed(&self, reason: impl Into<String>) -> ClassifierError {
        ClassifierError::RequestFailed {
            model: self.model_id.clone(),
            reason: reason.into(),
        }
    }

    fn invalid_response(&self, reason: impl Into<String>) -> ClassifierError {
        ClassifierError::InvalidResponse {
            model: self.model_id.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for HfInferenceClassifier {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn score(&self, text: &str, labels: &[&str]) -> Result<ScoredLabels, ClassifierError> {
        if labels.is_empty() {
            return Err(self.request_failed("no candidate labels"));
        }

        let body = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
                multi_label: false,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout {
                    model: self.model_id.clone(),
                    timeout: self.timeout,
                }
            } else {
                self.request_failed(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(match status {
                StatusCode::NOT_FOUND => ClassifierError::LoadFailed {
                    model: self.model_id.clone(),
                    reason: format!("model not found: {detail}"),
                },
                _ => self.request_failed(format!("HTTP {status}: {detail}")),
            });
        }

        let parsed: ZeroShotResponse = resp
            .json()
            .await
            .map_err(|e| self.invalid_response(e.to_string()))?;

        let pairs: Vec<(String, f32)> = match parsed {
            ZeroShotResponse::Columns { labels, scores } => {
                if labels.len() != scores.len() {
                    return Err(self.invalid_response(format!(
                        "{} labels but {} scores",
                        labels.len(),
                        scores.len()
                    )));
                }
                labels.into_iter().zip(scores).collect()
            }
            ZeroShotResponse::Rows(rows) => rows.into_iter().map(|r| (r.label, r.score)).collect(),
        };

        if pairs.is_empty() {
            return Err(self.invalid_response("empty label ranking"));
        }

        let scored = ScoredLabels::from_pairs(pairs);
        debug!(
            model = %self.model_id,
            top = scored.top().map(|(l, _)| l).unwrap_or(""),
            "Zero-shot scoring complete"
        );
        Ok(scored)
    }
}

/// Loads hosted models; a model counts as loaded once a warm-up call works.
pub struct HfInferenceLoader {
    client: reqwest::Client,
    endpoint: String,
    token: Option<SecretString>,
    timeout: Duration,
}

impl HfInferenceLoader {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        if !(config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "HF_INFERENCE_URL".into(),
                message: format!("expected an http(s) URL, got {:?}", config.endpoint),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.api_token.clone(),
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl ClassifierLoader for HfInferenceLoader {
    async fn load(&self, model_id: &str) -> Result<Arc<dyn ZeroShotClassifier>, ClassifierError> {
        let classifier = HfInferenceClassifier::new(
            self.client.clone(),
            &self.endpoint,
            model_id,
            self.token.clone(),
            self.timeout,
        );

        classifier
            .score(WARMUP_TEXT, &WARMUP_LABELS)
            .await
            .map_err(|e| ClassifierError::LoadFailed {
                model: model_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Arc::new(classifier))
    }
}
