//! HTTP surface: order intake and liveness endpoints.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::Result;
use crate::llm::create_generator;
use crate::pipeline::{KeywordFilter, Order, OrderProcessor, OrderResponse};
use crate::store::{LibSqlBackend, OrderStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<OrderProcessor>,
    /// Agent label reported by `/ping` and replied orders.
    pub agent: String,
}

/// Build the Axum router with the order and ping routes.
pub fn order_routes(processor: Arc<OrderProcessor>, agent: impl Into<String>) -> Router {
    let state = AppState {
        processor,
        agent: agent.into(),
    };

    Router::new()
        .route("/handle_order", post(handle_order))
        .route("/ping", get(ping))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Wire the processor from configuration.
///
/// A durable store that cannot be opened is logged and skipped; the agent
/// then deduplicates in memory only.
pub async fn build_processor(config: &AgentConfig) -> Result<OrderProcessor> {
    let generator = create_generator(&config.llm)?;
    let filter = KeywordFilter::new(&config.keywords);
    let mut processor = OrderProcessor::new(filter, generator, &config.contact);

    match &config.store {
        Some(store_config) => match LibSqlBackend::open(store_config).await {
            Ok(backend) => {
                let store: Arc<dyn OrderStore> = Arc::new(backend);
                processor = processor.with_durable_store(store);
            }
            Err(e) => {
                warn!(error = %e, "Order store unavailable, deduplicating in memory only");
            }
        },
        None => info!("No order store configured, deduplicating in memory only"),
    }

    Ok(processor)
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn handle_order(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Json<OrderResponse> {
    let span = info_span!("order", request_id = %Uuid::new_v4(), order_id = %order.id);
    let outcome = state.processor.handle(&order).instrument(span).await;
    Json(OrderResponse::from_outcome(outcome, &state.agent))
}

async fn ping(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "agent": state.agent,
    }))
}
