//! HTTP-level tests for the order intake router.
//!
//! The router is exercised directly through `tower::ServiceExt::oneshot`
//! with a stub reply generator, so no sockets or network calls are involved.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use code_agent::config::AgentConfig;
use code_agent::error::LlmError;
use code_agent::llm::ReplyGenerator;
use code_agent::llm::prompts::fallback_reply;
use code_agent::pipeline::{KeywordFilter, OrderProcessor};
use code_agent::server::{build_processor, order_routes};
use code_agent::store::{LibSqlBackend, OrderStore};

const BODY_LIMIT: usize = 1024 * 1024;
const CONTACT: &str = "@orders_bot";

/// Stub generator counting calls; fails every call when `fail` is set.
#[derive(Default)]
struct StubGenerator {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl ReplyGenerator for StubGenerator {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, _description: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::HttpStatus {
                provider: "stub".into(),
                status: 500,
                body: "internal error".into(),
            });
        }
        Ok("Здравствуйте! Сделаю парсер за два дня.".into())
    }
}

fn test_router(generator: Arc<StubGenerator>) -> Router {
    let processor = OrderProcessor::new(KeywordFilter::default_keywords(), generator, CONTACT);
    order_routes(Arc::new(processor), "code")
}

async fn post_order(app: &Router, payload: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/handle_order")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /handle_order");

    let resp = app.clone().oneshot(req).await.expect("oneshot /handle_order");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn ping_reports_alive() {
    let app = test_router(Arc::new(StubGenerator::default()));

    let req = Request::builder()
        .method("GET")
        .uri("/ping")
        .body(Body::empty())
        .expect("build GET /ping");
    let resp = app.oneshot(req).await.expect("oneshot /ping");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    let v: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(v, json!({"status": "alive", "agent": "code"}));
}

#[tokio::test]
async fn relevant_order_then_replay() {
    let generator = Arc::new(StubGenerator::default());
    let app = test_router(Arc::clone(&generator));
    let order = json!({"id": "42", "title": "Нужен скрипт", "description": "парсинг сайта"});

    let (status, v) = post_order(&app, order.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
    assert_eq!(v["agent"], "code");
    assert_eq!(v["response"], "Здравствуйте! Сделаю парсер за два дня.");

    let (status, v) = post_order(&app, order).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"status": "duplicate", "response": ""}));

    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn irrelevant_order_is_not_answered() {
    let generator = Arc::new(StubGenerator::default());
    let app = test_router(Arc::clone(&generator));

    let (status, v) = post_order(
        &app,
        json!({"id": "43", "title": "Нужен дизайн логотипа", "description": "срочно"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({"status": "irrelevant", "response": ""}));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn optional_fields_are_accepted() {
    let app = test_router(Arc::new(StubGenerator::default()));

    let (status, v) = post_order(
        &app,
        json!({
            "id": "77",
            "title": "Telegram bot",
            "link": "https://freelance.example/77",
            "description": "",
            "contact": "@client"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn generation_failure_returns_fallback_with_200() {
    let generator = Arc::new(StubGenerator {
        fail: true,
        ..StubGenerator::default()
    });
    let app = test_router(Arc::clone(&generator));

    let (status, v) = post_order(
        &app,
        json!({"id": "50", "title": "Chrome extension", "description": "нужен скрипт"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
    assert_eq!(v["response"], fallback_reply(CONTACT));
    assert!(v["response"].as_str().unwrap().contains(CONTACT));
}

#[tokio::test]
async fn malformed_order_is_rejected_without_generation() {
    let generator = Arc::new(StubGenerator::default());
    let app = test_router(Arc::clone(&generator));

    // Missing description.
    let (status, _) = post_order(&app, json!({"id": "1", "title": "бот"})).await;
    assert!(status.is_client_error(), "got {status}");

    // Wrong type for id.
    let (status, _) = post_order(
        &app,
        json!({"id": 1, "title": "бот", "description": "скрипт"}),
    )
    .await;
    assert!(status.is_client_error(), "got {status}");

    // Not JSON at all.
    let req = Request::builder()
        .method("POST")
        .uri("/handle_order")
        .header("content-type", "application/json")
        .body(Body::from("{id: 42"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());

    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn durable_store_dedups_across_routers() {
    let db: Arc<dyn OrderStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let order = json!({"id": "42", "title": "Нужен скрипт", "description": "парсинг сайта"});

    let first = OrderProcessor::new(
        KeywordFilter::default_keywords(),
        Arc::new(StubGenerator::default()),
        CONTACT,
    )
    .with_durable_store(Arc::clone(&db));
    let (_, v) = post_order(&order_routes(Arc::new(first), "code"), order.clone()).await;
    assert_eq!(v["status"], "ok");

    // Simulates a restart: fresh memory, same durable store.
    let generator = Arc::new(StubGenerator::default());
    let second = OrderProcessor::new(
        KeywordFilter::default_keywords(),
        Arc::clone(&generator) as Arc<dyn ReplyGenerator>,
        CONTACT,
    )
    .with_durable_store(db);
    let (_, v) = post_order(&order_routes(Arc::new(second), "code"), order).await;
    assert_eq!(v, json!({"status": "duplicate", "response": ""}));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn build_processor_from_default_config() {
    // No API key and no store: every relevant order gets the fallback reply.
    let mut config = AgentConfig::default();
    config.contact = CONTACT.to_string();
    config.llm.endpoint = "http://127.0.0.1:9/unreachable".to_string();

    let processor = build_processor(&config).await.unwrap();
    let app = order_routes(Arc::new(processor), config.agent_type.clone());

    let (status, v) = post_order(
        &app,
        json!({"id": "9", "title": "Python scraper", "description": "собрать данные"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["response"], fallback_reply(CONTACT));
}

#[tokio::test]
async fn build_processor_survives_unopenable_store() {
    let dir = tempfile::tempdir().unwrap();
    // A directory path cannot be opened as a database file.
    let mut config = AgentConfig::default();
    config.store = Some(code_agent::config::StoreConfig::Local {
        path: dir.path().to_path_buf(),
    });

    let processor = build_processor(&config).await.unwrap();
    let app = order_routes(Arc::new(processor), "code");
    let (status, v) = post_order(
        &app,
        json!({"id": "10", "title": "API integration", "description": ""}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
}
