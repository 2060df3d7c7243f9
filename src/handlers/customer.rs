//! Customer directory handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::HandlerResult;
use crate::services::geocoding::Location;
use crate::state::AppState;
use crate::types::{Customer, ListResponse};

/// GET /api/customers
pub async fn list(State(state): State<Arc<AppState>>) -> Json<ListResponse<Customer>> {
    let customers = state.book.directory().iter().cloned().collect();
    Json(ListResponse::new(customers))
}

/// GET /api/customers/:name/location
///
/// Always answers for a known customer; geocoder trouble yields the area
/// centroid.
pub async fn location(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> HandlerResult<Json<Location>> {
    let customer = state.book.directory().resolve(&name)?;
    Ok(Json(state.locations.locate(customer).await))
}
