//! Delivery attempt types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Area, Day, TimeSlot};
use crate::error::PlannerError;

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Fail
        }
    }

    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// Package size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSize {
    Small,
    Medium,
    Large,
}

impl PackageSize {
    pub const fn as_str(self) -> &'static str {
        match self {
            PackageSize::Small => "Small",
            PackageSize::Medium => "Medium",
            PackageSize::Large => "Large",
        }
    }
}

impl fmt::Display for PackageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageSize {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(PackageSize::Small),
            "medium" => Ok(PackageSize::Medium),
            "large" => Ok(PackageSize::Large),
            _ => Err(PlannerError::InvalidPackageSize(s.to_string())),
        }
    }
}

/// One row of the historical attempt log. Never modified once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    #[serde(rename = "Name")]
    pub customer: String,
    #[serde(rename = "Day of Delivery Attempt")]
    pub day: Day,
    #[serde(rename = "Time")]
    pub time_slot: TimeSlot,
    #[serde(rename = "Area")]
    pub area: Area,
    #[serde(rename = "Package Size")]
    pub package_size: PackageSize,
    #[serde(rename = "Delivery Status")]
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_size_parses_any_case() {
        assert_eq!("large".parse::<PackageSize>().unwrap(), PackageSize::Large);
        assert_eq!(" Small".parse::<PackageSize>().unwrap(), PackageSize::Small);
        assert!("Huge".parse::<PackageSize>().is_err());
    }

    #[test]
    fn outcome_from_flag() {
        assert!(Outcome::from_success(true).is_success());
        assert_eq!(Outcome::from_success(false), Outcome::Fail);
    }
}
