//! Route optimization handler

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, Json};
use tracing::info;

use super::{FormOrJson, HandlerResult};
use crate::state::AppState;
use crate::types::{RouteRequest, RouteResult, StopSet};

/// Stops for a request, in priority order: explicit parcel counts, order
/// ids, customer names, then today's pending orders.
fn stops_for(state: &AppState, request: RouteRequest) -> HandlerResult<StopSet> {
    if let Some(counts) = request.stops.filter(|counts| !counts.is_empty()) {
        return Ok(StopSet::from_counts(counts)?);
    }
    if !request.order_ids.is_empty() {
        return Ok(state.book.stops_for_orders(&request.order_ids)?);
    }
    if !request.customers.is_empty() {
        return Ok(StopSet::from_names(&request.customers));
    }
    Ok(state.book.todays_stops(&state.now()))
}

/// POST /api/route
pub async fn optimize(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<RouteRequest>,
) -> HandlerResult<Json<RouteResult>> {
    let stops = stops_for(&state, request)?;
    info!(
        "Optimizing route: {} stops, {} parcels",
        stops.len(),
        stops.total_parcels()
    );

    // CPU-bound search runs on the blocking pool
    let solver = state.clone();
    let route = tokio::task::spawn_blocking(move || solver.optimizer.optimize(&stops))
        .await
        .context("route search task failed")??;

    if !route.is_empty() {
        state.remember_route(&route);
    }
    Ok(Json(route))
}
