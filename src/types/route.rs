//! Route types

use serde::{Deserialize, Serialize};

use super::Area;
use crate::error::{PlannerError, PlannerResult};

/// Fixed starting location of the courier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Depot {
    pub label: String,
    pub area: Area,
}

impl Default for Depot {
    fn default() -> Self {
        Self {
            label: crate::defaults::DEFAULT_DEPOT_LABEL.to_string(),
            area: crate::defaults::DEFAULT_DEPOT_AREA,
        }
    }
}

/// Customers to visit with their parcel counts.
///
/// Each distinct customer is one stop, however many parcels it receives.
/// Stops keep the order in which they were first added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopSet {
    stops: Vec<(String, u32)>,
}

impl StopSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One parcel per occurrence; repeated names add parcels to the same stop
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for name in names {
            set.add(name.as_ref(), 1);
        }
        set
    }

    /// Explicit customer → parcel count mapping. Every count must be at least 1.
    pub fn from_counts<I, S>(counts: I) -> PlannerResult<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, count) in counts {
            if count == 0 {
                return Err(PlannerError::InvalidParcelCount(name.as_ref().trim().to_string()));
            }
            set.add(name.as_ref(), count);
        }
        Ok(set)
    }

    /// Add parcels for a customer. Names match case-insensitively.
    pub fn add(&mut self, name: &str, parcels: u32) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match self
            .stops
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, count)) => *count = count.saturating_add(parcels),
            None => self.stops.push((name.to_string(), parcels)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stops.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn total_parcels(&self) -> u32 {
        self.stops
            .iter()
            .fold(0u32, |total, (_, count)| total.saturating_add(*count))
    }
}

/// A stop on the optimized route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouteStop {
    pub customer: String,
    pub area: Area,
    pub address: String,
    pub parcels: u32,
}

/// One leg of the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouteLeg {
    pub from: String,
    pub from_address: String,
    pub to: String,
    pub to_address: String,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub distance: String,
    pub duration: String,
}

/// How the visiting order was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Zero or one stop, nothing to search
    Trivial,
    /// Every permutation evaluated
    Exhaustive,
    /// Held-Karp dynamic programming
    DynamicProgramming,
}

/// Optimized visiting order. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RouteResult {
    pub depot: String,
    pub route: Vec<String>,
    pub stops: Vec<RouteStop>,
    pub details: Vec<RouteLeg>,
    pub total_distance_km: f64,
    pub total_duration_minutes: u32,
    pub total_distance: String,
    pub total_duration: String,
    pub total_parcels: u32,
    pub strategy: SearchStrategy,
    pub permutations_evaluated: u64,
}

impl RouteResult {
    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_names_collapse_into_parcels() {
        let stops = StopSet::from_names(["Meera", "Aditya", "meera", "Meera"]);
        let collected: Vec<(&str, u32)> = stops.iter().collect();
        assert_eq!(collected, vec![("Meera", 3), ("Aditya", 1)]);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops.total_parcels(), 4);
    }

    #[test]
    fn blank_names_are_ignored() {
        let stops = StopSet::from_names(["", "  ", "Riya"]);
        assert_eq!(stops.len(), 1);
    }

    #[test]
    fn explicit_counts_are_kept() {
        let stops = StopSet::from_counts([("Kabir", 2), ("Diya", 5)]).unwrap();
        assert_eq!(stops.total_parcels(), 7);
        assert_eq!(stops.iter().next(), Some(("Kabir", 2)));
    }

    #[test]
    fn zero_count_is_rejected() {
        let err = StopSet::from_counts([("Kabir", 2), ("Riya", 0)]).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidParcelCount(name) if name == "Riya"));
    }

    #[test]
    fn parcel_totals_saturate() {
        let stops = StopSet::from_counts([("Riya", u32::MAX), ("Kabir", 1)]).unwrap();
        assert_eq!(stops.total_parcels(), u32::MAX);

        let mut repeated = StopSet::from_counts([("Riya", u32::MAX)]).unwrap();
        repeated.add("riya", 5);
        assert_eq!(repeated.iter().next(), Some(("Riya", u32::MAX)));
    }
}
