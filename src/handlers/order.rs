//! Order lifecycle handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use super::{FormOrJson, HandlerResult};
use crate::state::AppState;
use crate::types::{
    CustomerParcels, DeliveryOutcome, DeliveryReport, DeliveryRequest, HistoryQuery,
    HistoryResponse, ListResponse, NewOrder, OrderId, OrderView, PlaceOrderRequest,
    PlaceOrderResponse, TimeSlot,
};

const DEFAULT_HISTORY_LIMIT: usize = 20;

fn parse_slot(time: Option<&str>) -> HandlerResult<Option<TimeSlot>> {
    let slot = time
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<TimeSlot>)
        .transpose()?;
    Ok(slot)
}

/// GET /api/orders
pub async fn list(State(state): State<Arc<AppState>>) -> Json<ListResponse<OrderView>> {
    Json(ListResponse::new(state.book.list_pending()))
}

/// GET /api/orders/today
pub async fn today(State(state): State<Arc<AppState>>) -> Json<ListResponse<CustomerParcels>> {
    Json(ListResponse::new(state.book.todays_parcels(&state.now())))
}

/// POST /api/orders
pub async fn place(
    State(state): State<Arc<AppState>>,
    FormOrJson(request): FormOrJson<PlaceOrderRequest>,
) -> HandlerResult<(StatusCode, Json<PlaceOrderResponse>)> {
    debug!("Place order request for {}", request.name);

    let new_order = NewOrder {
        customer: request.name,
        delivery_day: request.delivery_day.parse()?,
        package_size: request.package_size.parse()?,
        time_slot: parse_slot(request.time.as_deref())?,
    };
    let order = state
        .book
        .place_order(new_order, &state.now(), &mut rand::thread_rng())?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            success: true,
            order: state.book.view(&order),
            verification_code: order.verification_code,
        }),
    ))
}

/// POST /api/orders/:id/ready
pub async fn ready(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Json<OrderView>> {
    let id: OrderId = id.parse()?;
    let order = state.book.mark_ready(id)?;
    Ok(Json(state.book.view(&order)))
}

/// POST /api/orders/:id/delivery
pub async fn delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    FormOrJson(request): FormOrJson<DeliveryRequest>,
) -> HandlerResult<Json<DeliveryOutcome>> {
    let id: OrderId = id.parse()?;
    let report = DeliveryReport {
        success: request.success,
        verification_code: request.verification_code,
        time_slot: parse_slot(request.time.as_deref())?,
    };
    let outcome = state.book.record_delivery(id, report, &state.now())?;
    Ok(Json(outcome))
}

/// GET /api/history?customer=&limit=
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(state.book.history(query.customer.as_deref(), limit))
}
