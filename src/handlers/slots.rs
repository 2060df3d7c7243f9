//! Delivery slot prediction handler

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::debug;

use super::{FormOrJson, HandlerResult};
use crate::services::estimator::PredictionQuery;
use crate::services::orders::PredictionReport;
use crate::state::AppState;
use crate::types::{Day, PredictRequest};

/// POST /api/predict
///
/// Unknown customers get the no-data sentinel rather than an error.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<PredictRequest>,
) -> HandlerResult<Json<PredictionReport>> {
    let now = state.now();
    let day = match request.day.as_deref().map(str::trim) {
        Some(day) if !day.is_empty() => day.parse()?,
        _ => Day::of(&now),
    };
    let top_k = request
        .top_k
        .filter(|k| *k > 0)
        .unwrap_or(state.config.top_k);

    debug!("Predicting top {} slots for {} on {}", top_k, request.name, day);

    let query = PredictionQuery {
        customer: request.name,
        day,
        top_k,
        now,
    };
    let report = state.book.predict(&query, &mut rand::thread_rng());
    Ok(Json(report))
}
