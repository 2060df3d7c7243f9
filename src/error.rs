//! Domain error type shared by services, handlers and the CLI

use thiserror::Error;

/// Every failure a planner operation can surface to its caller
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("unknown customer: {0}")]
    UnknownCustomer(String),

    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("invalid day '{0}'")]
    InvalidDay(String),

    #[error("invalid time slot '{0}'")]
    InvalidTimeSlot(String),

    #[error("unknown area '{0}'")]
    InvalidArea(String),

    #[error("invalid package size '{0}'")]
    InvalidPackageSize(String),

    #[error("delivery day {day} is outside the booking window ({allowed})")]
    DayOutsideWindow { day: String, allowed: String },

    #[error("time slot {0} has already passed today")]
    SlotPassed(String),

    #[error("order {id} cannot move from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("verification code does not match for order {0}")]
    VerificationFailed(String),

    #[error("parcel count for {0} must be at least 1")]
    InvalidParcelCount(String),

    #[error("{count} distinct stops exceed the limit of {limit}")]
    TooManyStops { count: usize, limit: usize },

    #[error("{0} is temporarily unavailable (circuit breaker open)")]
    ExternalUnavailable(&'static str),

    #[error("{service} did not answer within {seconds}s")]
    ExternalTimeout { service: &'static str, seconds: u64 },

    #[error("{service} call failed: {message}")]
    ExternalFailed { service: &'static str, message: String },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("attempt log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    /// Stable machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCustomer(_) => "UNKNOWN_CUSTOMER",
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::InvalidDay(_) => "INVALID_DAY",
            Self::InvalidTimeSlot(_) => "INVALID_TIME_SLOT",
            Self::InvalidArea(_) => "INVALID_AREA",
            Self::InvalidPackageSize(_) => "INVALID_PACKAGE_SIZE",
            Self::DayOutsideWindow { .. } => "DAY_OUTSIDE_WINDOW",
            Self::SlotPassed(_) => "SLOT_PASSED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::VerificationFailed(_) => "VERIFICATION_FAILED",
            Self::InvalidParcelCount(_) => "INVALID_PARCEL_COUNT",
            Self::TooManyStops { .. } => "TOO_MANY_STOPS",
            Self::ExternalUnavailable(_) => "EXTERNAL_UNAVAILABLE",
            Self::ExternalTimeout { .. } => "EXTERNAL_TIMEOUT",
            Self::ExternalFailed { .. } => "EXTERNAL_FAILED",
            Self::Io(_) | Self::Csv(_) | Self::Json(_) => "STORAGE_ERROR",
        }
    }

    /// True for errors caused by a reference to something that does not exist
    pub fn is_unknown_entity(&self) -> bool {
        matches!(self, Self::UnknownCustomer(_) | Self::OrderNotFound(_))
    }

    /// True for errors caused by the request content itself
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDay(_)
                | Self::InvalidTimeSlot(_)
                | Self::InvalidArea(_)
                | Self::InvalidPackageSize(_)
                | Self::DayOutsideWindow { .. }
                | Self::SlotPassed(_)
                | Self::InvalidTransition { .. }
                | Self::VerificationFailed(_)
                | Self::InvalidParcelCount(_)
                | Self::TooManyStops { .. }
        )
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
