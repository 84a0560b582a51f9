//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};

use omnibus_chat::ChatState;
use omnibus_core::types::{Passage, Turn};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

/// Request body for POST /api/messages.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<Passage>,
    pub messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub state: ChatState,
    pub messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub session_open: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let session_open = match state.gateway {
        Some(ref gateway) => gateway.is_open().await,
        None => false,
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        session_open,
    })
}

/// GET / - the chat page.
pub async fn index() -> impl IntoResponse {
    Html(omnibus_ui::CHAT_HTML)
}

/// GET /api/messages - current transcript.
pub async fn list_messages(State(state): State<AppState>) -> Json<MessagesResponse> {
    let chat = state.chat.lock().await;
    Json(MessagesResponse {
        state: chat.state(),
        messages: chat.transcript().to_vec(),
    })
}

/// POST /api/messages - ask a question and wait for the full answer.
pub async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut chat = state.chat.lock().await;
    let reply = chat.ask(&request.question).await.map_err(|e| {
        tracing::warn!(error = %e, "Question failed");
        ApiError::from(e)
    })?;

    Ok(Json(AskResponse {
        answer: reply.answer,
        sources: reply.passages,
        messages: chat.transcript().to_vec(),
    }))
}

/// DELETE /api/messages - "Clear Chat".
pub async fn reset(State(state): State<AppState>) -> Json<MessagesResponse> {
    let mut chat = state.chat.lock().await;
    chat.reset();
    Json(MessagesResponse {
        state: chat.state(),
        messages: Vec::new(),
    })
}
