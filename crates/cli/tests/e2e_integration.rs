//! End-to-end tests for the Amino Chat pipeline.
//!
//! These exercise the full path from an HTTP request through
//! classification, the answer store, the model, and formatting, plus the
//! `aminochat` binary itself.

use std::process::Command;
use std::sync::{Arc, Mutex};

use aminochat_chat::ChatService;
use aminochat_config::{ChatConfig, GatewayConfig};
use aminochat_core::{
    AnswerRecord, Category, Generation, GenerationRequest, Provider, ProviderError,
};
use aminochat_gateway::{GatewayState, build_router};
use aminochat_store::InMemoryStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A provider that returns one scripted outcome and records every request.
struct ScriptedProvider {
    outcome: Result<Generation, ProviderError>,
    seen: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn new(outcome: Result<Generation, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn text(reply: &str) -> Arc<Self> {
        Self::new(Ok(Generation::Text(reply.into())))
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, ProviderError> {
        self.seen.lock().unwrap().push(request);
        self.outcome.clone()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::with_answers(vec![
        AnswerRecord::new(Category::Greeting, "Halo! Selamat datang di **RSJ Amino**."),
        AnswerRecord::new(Category::Farewell, "Terima kasih, semoga sehat selalu."),
        AnswerRecord::new(
            Category::GeneralInquiry,
            "Kesehatan mental adalah kondisi sejahtera.",
        ),
    ]));
    store
        .add_question(1, "Bagaimana cara mendaftar?", Category::Greeting.id().into())
        .await;
    store
}

async fn app(provider: Arc<ScriptedProvider>) -> axum::Router {
    let store = seeded_store().await;
    let chat = ChatService::new(store, provider, &ChatConfig::default());
    let state = Arc::new(GatewayState { chat });
    build_router(state, &GatewayConfig::default())
}

async fn post_chat(app: axum::Router, input: &str) -> (StatusCode, serde_json::Value) {
    let body = serde_json::json!({ "userInput": input }).to_string();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Chat pipeline ────────────────────────────────────────────────────────

#[tokio::test]
async fn greeting_is_answered_from_the_store() {
    let provider = ScriptedProvider::text("unused");
    let (status, json) = post_chat(app(provider.clone()).await, "Halo kak").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["response"],
        "<p>Halo! Selamat datang di <strong>RSJ Amino</strong>.</p>"
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn nonsense_gets_the_apology() {
    let provider = ScriptedProvider::text("unused");
    let (status, json) = post_chat(app(provider.clone()).await, "xyzzy plugh").await;

    assert_eq!(status, StatusCode::OK);
    let apology = aminochat_chat::format(&ChatConfig::default().unrecognized_message);
    assert_eq!(json["response"], apology);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn open_ended_question_is_generated_with_seed() {
    let provider = ScriptedProvider::text("Depresi bisa ditangani.\n\n1. Konsultasi\n2. Terapi");
    let (status, json) = post_chat(app(provider.clone()).await, "apa itu depresi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["response"],
        "<p>Depresi bisa ditangani.</p><p>1. Konsultasi<br>2. Terapi</p>"
    );

    let seen = provider.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].seed_context, "Kesehatan mental adalah kondisi sejahtera.");
}

#[tokio::test]
async fn safety_block_returns_the_notice() {
    let provider = ScriptedProvider::new(Ok(Generation::SafetyBlocked));
    let (status, json) = post_chat(app(provider).await, "apa itu depresi").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["response"], ChatConfig::default().safety_notice);
}

#[tokio::test]
async fn provider_outage_is_a_500() {
    let provider = ScriptedProvider::new(Err(ProviderError::Network("connection reset".into())));
    let (status, json) = post_chat(app(provider).await, "apa itu depresi").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Internal Server Error");
}

#[tokio::test]
async fn faq_lists_joined_questions() {
    let router = app(ScriptedProvider::text("unused")).await;
    let resp = router
        .oneshot(Request::builder().uri("/faq").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["question"], "Bagaimana cara mendaftar?");
}

// ── Binary ───────────────────────────────────────────────────────────────

#[test]
fn classify_command_prints_category() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = Command::new(env!("CARGO_BIN_EXE_aminochat"))
        .args(["--config", config.to_str().unwrap(), "classify", "halo selamat pagi"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("greeting"), "stdout: {stdout}");
    assert!(stdout.contains("canned answer"), "stdout: {stdout}");
}
