//! HTTP gateway — a single `POST /chat` endpoint in front of the
//! orchestrator.
//!
//! Request: `{"query": "...", "session_id": "..."}` (session id optional;
//! one is generated and returned when absent, so callers can continue the
//! conversation).
//!
//! Responses use a status envelope:
//! - `{"status": "success", "data": {"response": "...", "session_id": "..."}}`
//! - `{"status": "error", "message": "..."}`

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use parley_agent::Orchestrator;
use parley_core::config::GatewayConfig;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    query: String,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope {
    Success { data: ChatData },
    Error { message: String },
}

#[derive(Debug, Serialize)]
struct ChatData {
    response: String,
    session_id: String,
}

/// Serve the gateway until the process is stopped.
pub async fn run(gateway: &GatewayConfig, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let addr = format!("{}:{}", gateway.host, gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "gateway listening");
    axum::serve(listener, router(orchestrator)).await?;
    Ok(())
}

fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .with_state(orchestrator)
}

async fn chat(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(Envelope::Error {
                message: "query must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let response = orchestrator.handle_turn(&session_id, &request.query).await;

    Json(Envelope::Success {
        data: ChatData {
            response,
            session_id,
        },
    })
    .into_response()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
