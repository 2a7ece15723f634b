//! Integration tests for the hosted inference and chat completion backends.
//!
//! Each test spins up an Axum server on a random port that mimics the remote
//! API, then drives the real reqwest clients through `EmailAssistant`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use email_triage::config::{ClassifierConfig, RefinerConfig};
use email_triage::nlp::{Category, Intent};
use email_triage::reply::{ReplyContext, ReplySource};
use email_triage::{EmailAssistant, ProcessOutcome};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Text with no override keywords, so the mock model's ranking stands.
const NEUTRAL_TEXT: &str = "Preciso de ajuda para acessar o sistema";

#[derive(Default)]
struct MockState {
    /// Requests per model id.
    hits: Mutex<HashMap<String, usize>>,
    /// Authorization headers seen by the inference route.
    auth: Mutex<Vec<String>>,
    /// Bodies seen by the chat completion route.
    completions: Mutex<Vec<Value>>,
}

impl MockState {
    fn hits(&self, model: &str) -> usize {
        self.hits.lock().unwrap().get(model).copied().unwrap_or(0)
    }
}

/// Ranks the first candidate label at 0.7 and splits 0.3 over the rest.
///
/// Org `missing` answers 404, org `rows` answers in the list-of-pairs shape,
/// anything else answers in the columnar shape.
async fn zero_shot(
    State(state): State<Arc<MockState>>,
    Path((org, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let model = format!("{org}/{name}");
    *state.hits.lock().unwrap().entry(model).or_default() += 1;
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth.lock().unwrap().push(auth.to_string());
    }

    if org == "missing" {
        return (StatusCode::NOT_FOUND, "Model not found").into_response();
    }

    let labels: Vec<String> = body["parameters"]["candidate_labels"]
        .as_array()
        .map(|a| a.iter().filter_map(|l| l.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let rest = 0.3 / (labels.len().saturating_sub(1).max(1) as f32);
    let scores: Vec<f32> = (0..labels.len())
        .map(|i| if i == 0 { 0.7 } else { rest })
        .collect();

    if org == "rows" {
        let rows: Vec<Value> = labels
            .iter()
            .zip(&scores)
            .map(|(label, score)| json!({ "label": label, "score": score }))
            .collect();
        Json(Value::Array(rows)).into_response()
    } else {
        Json(json!({ "sequence": body["inputs"], "labels": labels, "scores": scores }))
            .into_response()
    }
}

/// `ok` answers with padded text, `fail` with a 500, `slow` after two seconds.
async fn chat_completions(
    State(state): State<Arc<MockState>>,
    Path(mode): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.completions.lock().unwrap().push(body);
    match mode.as_str() {
        "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(completion("tarde demais")).into_response()
        }
        _ => Json(completion("  Prezado cliente, recebemos sua mensagem.  ")).into_response(),
    }
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 40, "completion_tokens": 12 }
    })
}

/// Start the mock server on a random port, return (base url, state).
async fn start_server() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/models/{org}/{name}", post(zero_shot))
        .route("/{mode}/v1/chat/completions", post(chat_completions))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), state)
}

fn classifier_config(base: &str, primary: &str, fallback: &str) -> ClassifierConfig {
    ClassifierConfig {
        primary_model: primary.into(),
        fallback_model: fallback.into(),
        endpoint: format!("{base}/models"),
        api_token: None,
        timeout: Duration::from_secs(2),
    }
}

fn refiner_config(base: &str, mode: &str) -> RefinerConfig {
    let mut config = RefinerConfig::new("sk-test");
    config.base_url = format!("{base}/{mode}/v1");
    config.timeout = Duration::from_millis(300);
    config
}

async fn process(assistant: &EmailAssistant, text: &str) -> ProcessOutcome {
    timeout(TEST_TIMEOUT, assistant.process(text, &ReplyContext::new()))
        .await
        .expect("process timed out")
}

#[tokio::test]
async fn columnar_response_drives_classification() {
    let (base, state) = start_server().await;
    let config = classifier_config(&base, "acme/primary", "acme/fallback");
    let assistant = EmailAssistant::from_config(&config, None).unwrap();

    let outcome = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(outcome.category, Category::Productive);
    assert_eq!(outcome.intent, Intent::StatusRequest);
    assert!((outcome.category_score - 0.7).abs() < 1e-4);
    assert!((outcome.intent_score - 0.7).abs() < 1e-4);
    assert_eq!(outcome.reply_source, ReplySource::Template);
    assert!(outcome.suggested_reply.starts_with("Assunto: Atualização do seu atendimento"));

    // Warm-up plus one call per query; the fallback is never touched.
    assert_eq!(state.hits("acme/primary"), 3);
    assert_eq!(state.hits("acme/fallback"), 0);
}

#[tokio::test]
async fn row_response_shape_is_accepted() {
    let (base, _state) = start_server().await;
    let config = classifier_config(&base, "rows/primary", "rows/fallback");
    let assistant = EmailAssistant::from_config(&config, None).unwrap();

    let outcome = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(outcome.category, Category::Productive);
    assert_eq!(outcome.intent, Intent::StatusRequest);
}

#[tokio::test]
async fn missing_primary_falls_back_once() {
    let (base, state) = start_server().await;
    let config = classifier_config(&base, "missing/primary", "acme/fallback");
    let assistant = EmailAssistant::from_config(&config, None).unwrap();

    let first = process(&assistant, NEUTRAL_TEXT).await;
    let second = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(first.category, Category::Productive);
    assert_eq!(first, second);
    assert_eq!(state.hits("missing/primary"), 1);
    // One warm-up, then two queries per email.
    assert_eq!(state.hits("acme/fallback"), 5);
}

#[tokio::test]
async fn no_loadable_model_yields_error_sentinel() {
    let (base, state) = start_server().await;
    let config = classifier_config(&base, "missing/primary", "missing/fallback");
    let assistant = EmailAssistant::from_config(&config, None).unwrap();

    let first = process(&assistant, NEUTRAL_TEXT).await;
    let second = process(&assistant, "Outra mensagem qualquer").await;

    for outcome in [&first, &second] {
        assert_eq!(outcome.category, Category::Error);
        assert_eq!(outcome.intent, Intent::ProcessingError);
        assert_eq!(outcome.category_score, 0.0);
        assert_eq!(outcome.intent_score, 0.0);
        assert!(outcome.suggested_reply.contains("'Erro no processamento'"));
        assert_eq!(outcome.reply_source, ReplySource::Template);
    }

    // The failed initialization is cached, not retried per email.
    assert_eq!(state.hits("missing/primary"), 1);
    assert_eq!(state.hits("missing/fallback"), 1);
}

#[tokio::test]
async fn bearer_token_is_sent_when_configured() {
    let (base, state) = start_server().await;
    let mut config = classifier_config(&base, "acme/primary", "acme/fallback");
    config.api_token = Some("hf-test".into());
    let assistant = EmailAssistant::from_config(&config, None).unwrap();

    process(&assistant, NEUTRAL_TEXT).await;

    let auth = state.auth.lock().unwrap();
    assert!(!auth.is_empty());
    assert!(auth.iter().all(|h| h == "Bearer hf-test"));
}

#[tokio::test]
async fn refinement_success_is_tagged_and_trimmed() {
    let (base, state) = start_server().await;
    let config = classifier_config(&base, "acme/primary", "acme/fallback");
    let refiner = refiner_config(&base, "ok");
    let assistant = EmailAssistant::from_config(&config, Some(&refiner)).unwrap();

    let outcome = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(outcome.reply_source, ReplySource::OpenAiTemplate);
    assert_eq!(outcome.suggested_reply, "Prezado cliente, recebemos sua mensagem.");

    let completions = state.completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0]["model"], "gpt-4o-mini");
    let prompt = completions[0]["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("Assunto: Atualização do seu atendimento"));
}

#[tokio::test]
async fn refinement_server_error_falls_back_to_template() {
    let (base, state) = start_server().await;
    let config = classifier_config(&base, "acme/primary", "acme/fallback");
    let refiner = refiner_config(&base, "fail");
    let assistant = EmailAssistant::from_config(&config, Some(&refiner)).unwrap();

    let outcome = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(outcome.reply_source, ReplySource::Template);
    assert!(outcome.suggested_reply.starts_with("Assunto: Atualização do seu atendimento"));
    // Single attempt, no retry.
    assert_eq!(state.completions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn slow_refinement_times_out_to_template() {
    let (base, _state) = start_server().await;
    let config = classifier_config(&base, "acme/primary", "acme/fallback");
    let refiner = refiner_config(&base, "slow");
    let assistant = EmailAssistant::from_config(&config, Some(&refiner)).unwrap();

    let outcome = process(&assistant, NEUTRAL_TEXT).await;

    assert_eq!(outcome.reply_source, ReplySource::Template);
    assert!(!outcome.suggested_reply.is_empty());
}
