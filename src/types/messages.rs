//! HTTP message types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Area, DeliveryAttempt, OrderView};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// List response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Accepts either a list or a single comma-separated string (form posts)
fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        OneOrMany::Many(items) => items,
    })
}

/// Request to place an order
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    #[serde(alias = "customer")]
    pub name: String,
    pub delivery_day: String,
    pub package_size: String,
    #[serde(default, alias = "time_slot")]
    pub time: Option<String>,
}

/// Placed order with the code the customer hands to the courier
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order: OrderView,
    pub verification_code: String,
}

/// Delivery report for an order
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryRequest {
    pub success: bool,
    #[serde(default)]
    pub verification_code: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Today's orders for one customer
#[derive(Debug, Clone, Serialize)]
pub struct CustomerParcels {
    pub customer: String,
    pub area: Area,
    pub address: String,
    pub parcel_count: u32,
    pub orders: Vec<OrderView>,
}

/// Request for optimal delivery slots
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub name: String,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Route optimization request. Empty means "today's pending orders".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRequest {
    #[serde(default, deserialize_with = "list_or_csv", alias = "selected_customers")]
    pub customers: Vec<String>,
    #[serde(default)]
    pub stops: Option<BTreeMap<String, u32>>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub order_ids: Vec<String>,
}

/// Question for the assistant
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "query")]
    pub message: String,
}

/// History query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Recent attempts, newest first
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub attempts: Vec<DeliveryAttempt>,
    pub total: usize,
}
