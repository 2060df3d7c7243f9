//! HTTP handlers
//!
//! Every handler takes the shared [`AppState`] and answers JSON. Request
//! bodies may be JSON or form-encoded.

pub mod assistant;
pub mod customer;
pub mod order;
pub mod ping;
pub mod route;
pub mod slots;

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::PlannerError;
use crate::state::AppState;
use crate::types::ErrorResponse;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(ping::health))
        .route("/api/customers", get(customer::list))
        .route("/api/customers/:name/location", get(customer::location))
        .route("/api/orders", get(order::list).post(order::place))
        .route("/api/orders/today", get(order::today))
        .route("/api/orders/:id/ready", post(order::ready))
        .route("/api/orders/:id/delivery", post(order::delivery))
        .route("/api/history", get(order::history))
        .route("/api/predict", post(slots::predict))
        .route("/api/route", post(route::optimize))
        .route("/api/chat", post(assistant::chat))
        .route("/api/conditions", get(assistant::conditions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==========================================================================
// Errors
// ==========================================================================

/// Error returned by handlers, rendered as an [`ErrorResponse`] body
#[derive(Debug)]
pub enum AppError {
    Planner(PlannerError),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Planner(e) if e.is_unknown_entity() => StatusCode::NOT_FOUND,
            Self::Planner(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            Self::Planner(
                PlannerError::ExternalUnavailable(_)
                | PlannerError::ExternalTimeout { .. }
                | PlannerError::ExternalFailed { .. },
            ) => StatusCode::BAD_GATEWAY,
            Self::Planner(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Planner(e) => e.code(),
            Self::BadRequest(_) => "INVALID_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PlannerError> for AppError {
    fn from(err: PlannerError) -> Self {
        Self::Planner(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Planner(e) => e.to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::Internal(e) => format!("{:#}", e),
        };
        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), self.code(), message);
        }
        (status, Json(ErrorResponse::new(self.code(), message))).into_response()
    }
}

pub type HandlerResult<T> = Result<T, AppError>;

// ==========================================================================
// Body extraction
// ==========================================================================

/// Body extractor accepting JSON or `application/x-www-form-urlencoded`.
/// An empty body deserializes as `{}`.
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(format!("invalid form body: {}", e)))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(format!("cannot read body: {}", e)))?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| AppError::bad_request(format!("invalid JSON body: {}", e)))
    }
}

// ==========================================================================
// Router tests
// ==========================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use chrono::{NaiveDate, NaiveDateTime};
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::Config;

    /// Monday 2024-01-15 10:30
    pub(crate) fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    pub(crate) fn test_state(dir: &TempDir) -> Arc<AppState> {
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(config)
            .unwrap()
            .with_clock(Arc::new(monday_morning));
        Arc::new(state)
    }

    pub(crate) async fn send(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = HttpRequest::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn test_error_status_mapping() {
        let not_found = AppError::from(PlannerError::UnknownCustomer("Zed".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(PlannerError::InvalidDay("Funday".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let storage = AppError::from(PlannerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(storage.code(), "STORAGE_ERROR");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, body) = send(&state, "GET", "/api/customers/Nobody/location", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "UNKNOWN_CUSTOMER");
        assert!(body["error"]["message"].as_str().unwrap().contains("Nobody"));
    }

    #[tokio::test]
    async fn test_form_body_is_accepted() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/orders")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Riya&delivery_day=Tuesday&package_size=Small"))
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.book.list_pending().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);
        let (status, _) = send(&state, "GET", "/api/nothing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
