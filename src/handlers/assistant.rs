//! Chat assistant and conditions feed handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{AppError, FormOrJson, HandlerResult};
use crate::services::chat::ChatReply;
use crate::services::conditions::{Conditions, ConditionsKind};
use crate::state::AppState;
use crate::types::ChatRequest;

/// POST /api/chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<ChatRequest>,
) -> HandlerResult<Json<ChatReply>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::bad_request("message must not be empty"));
    }

    let context = state.chat_context(&mut rand::thread_rng());
    Ok(Json(state.assistant.ask(message, &context).await))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConditionsParams {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// GET /api/conditions?type=all|weather|traffic|festivals
pub async fn conditions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConditionsParams>,
) -> HandlerResult<Json<Conditions>> {
    let kind: ConditionsKind = params
        .kind
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e: anyhow::Error| AppError::bad_request(e.to_string()))?;
    Ok(Json(state.conditions.current(kind, state.now()).await))
}
