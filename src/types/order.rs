//! Order types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Area, DeliveryAttempt, Day, PackageSize, TimeSlot};
use crate::error::PlannerError;

/// First order number handed out on an empty book
pub const FIRST_ORDER_NUMBER: u32 = 1001;

/// Monotonic order identifier, rendered as `ORD1001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(u32);

impl OrderId {
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORD{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = PlannerError;

    /// Accepts `ORD1001`, `ord1001` or the bare number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .get(..3)
            .filter(|prefix| prefix.eq_ignore_ascii_case("ORD"))
            .map_or(trimmed, |_| &trimmed[3..]);
        digits
            .parse()
            .map(OrderId)
            .map_err(|_| PlannerError::OrderNotFound(trimmed.to_string()))
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Ready,
    Success,
    Fail,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Ready => "Ready",
            OrderStatus::Success => "Success",
            OrderStatus::Fail => "Fail",
        }
    }

    /// Whether a delivery can still be attempted
    pub fn is_open(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Ready)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order waiting for delivery, as stored in the pending snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub customer: String,
    pub delivery_day: Day,
    pub area: Area,
    pub package_size: PackageSize,
    #[serde(default)]
    pub time_slot: Option<TimeSlot>,
    pub status: OrderStatus,
    #[serde(default)]
    pub failed_attempts: u32,
    pub verification_code: String,
    pub created_at: DateTime<Utc>,
}

impl PendingOrder {
    /// Listing form without the verification code
    pub fn view(&self, address: &str) -> OrderView {
        OrderView {
            order_id: self.order_id,
            customer: self.customer.clone(),
            delivery_day: self.delivery_day,
            area: self.area,
            address: address.to_string(),
            package_size: self.package_size,
            time_slot: self.time_slot,
            status: self.status,
            failed_attempts: self.failed_attempts,
            created_at: self.created_at,
        }
    }
}

/// Pending order as shown to the courier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrderView {
    pub order_id: OrderId,
    pub customer: String,
    pub delivery_day: Day,
    pub area: Area,
    pub address: String,
    pub package_size: PackageSize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<TimeSlot>,
    pub status: OrderStatus,
    pub failed_attempts: u32,
    pub created_at: DateTime<Utc>,
}

/// Validated input for placing an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: String,
    pub delivery_day: Day,
    pub package_size: PackageSize,
    pub time_slot: Option<TimeSlot>,
}

/// What the courier reports after a delivery attempt
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub success: bool,
    pub verification_code: Option<String>,
    /// Slot the attempt happened in; defaults to the current hour
    pub time_slot: Option<TimeSlot>,
}

/// Result of a reported delivery attempt
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Delivered and removed from the pending set
    Delivered { order: PendingOrder, attempt: DeliveryAttempt },
    /// Failed and carried forward to the next day
    Rescheduled { order: PendingOrder, attempt: DeliveryAttempt },
    /// Failed for the last allowed time and removed from the pending set
    Abandoned { order: PendingOrder, attempt: DeliveryAttempt },
}

#[cfg(test)]
impl DeliveryOutcome {
    pub fn attempt(&self) -> &DeliveryAttempt {
        match self {
            Self::Delivered { attempt, .. }
            | Self::Rescheduled { attempt, .. }
            | Self::Abandoned { attempt, .. } => attempt,
        }
    }

    pub fn order(&self) -> &PendingOrder {
        match self {
            Self::Delivered { order, .. }
            | Self::Rescheduled { order, .. }
            | Self::Abandoned { order, .. } => order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_formats_with_prefix() {
        assert_eq!(OrderId::new(1001).to_string(), "ORD1001");
        assert_eq!(OrderId::new(1001).next(), OrderId::new(1002));
    }

    #[test]
    fn order_id_parses_prefixed_and_bare() {
        assert_eq!("ORD1042".parse::<OrderId>().unwrap(), OrderId::new(1042));
        assert_eq!("ord7".parse::<OrderId>().unwrap(), OrderId::new(7));
        assert_eq!("1003".parse::<OrderId>().unwrap(), OrderId::new(1003));
        assert!("ORDxyz".parse::<OrderId>().is_err());
    }

    #[test]
    fn only_pending_and_ready_are_open() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Ready.is_open());
        assert!(!OrderStatus::Success.is_open());
        assert!(!OrderStatus::Fail.is_open());
    }
}
