//! Success-rate estimator
//!
//! Aggregates the attempt log into success ratios per (customer, slot),
//! (customer, day) and (customer, day, slot) and ranks a customer's slots
//! for a target day. Statistics are updated in place as attempts arrive.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rand::Rng;
use serde::Serialize;

use crate::types::{Day, DeliveryAttempt, Outcome, TimeSlot};

/// Label returned for customers without any history
pub const NO_DATA_LABEL: &str = "No data available for this person";

/// Failure rate reported alongside [`NO_DATA_LABEL`]
pub const NO_DATA_FAILURE_RATE: f64 = 100.0;

const GENERAL_WEIGHT: f64 = 0.3;
const DAY_SPECIFIC_WEIGHT: f64 = 0.7;

/// Success count over attempt count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    successes: u32,
    attempts: u32,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        self.attempts += 1;
        if outcome.is_success() {
            self.successes += 1;
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        (self.attempts > 0).then(|| f64::from(self.successes) / f64::from(self.attempts))
    }
}

/// Tallies for one customer
#[derive(Debug, Clone, Default)]
pub struct CustomerStats {
    by_slot: HashMap<TimeSlot, Tally>,
    by_day: HashMap<Day, Tally>,
    by_day_slot: HashMap<(Day, TimeSlot), Tally>,
}

impl CustomerStats {
    fn record(&mut self, attempt: &DeliveryAttempt) {
        let outcome = attempt.outcome;
        self.by_slot.entry(attempt.time_slot).or_default().record(outcome);
        self.by_day.entry(attempt.day).or_default().record(outcome);
        self.by_day_slot
            .entry((attempt.day, attempt.time_slot))
            .or_default()
            .record(outcome);
    }

    pub fn day_ratio(&self, day: Day) -> Option<f64> {
        self.by_day.get(&day).and_then(Tally::ratio)
    }

    pub fn day_slot_ratio(&self, day: Day, slot: TimeSlot) -> Option<f64> {
        self.by_day_slot.get(&(day, slot)).and_then(Tally::ratio)
    }

    /// Every slot with at least one attempt, scored for `day`
    fn scored_slots(&self, day: Day) -> Vec<(TimeSlot, f64)> {
        let has_day = self.by_day.contains_key(&day);
        self.by_slot
            .iter()
            .filter_map(|(&slot, tally)| {
                let general = tally.ratio()?;
                let score = match self.day_slot_ratio(day, slot) {
                    Some(specific) if has_day => {
                        GENERAL_WEIGHT * general + DAY_SPECIFIC_WEIGHT * specific
                    }
                    _ => general,
                };
                Some((slot, score))
            })
            .collect()
    }
}

/// Success statistics for every customer in the attempt log
#[derive(Debug, Clone, Default)]
pub struct SuccessStats {
    customers: HashMap<String, CustomerStats>,
}

fn customer_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl SuccessStats {
    pub fn from_attempts<'a, I>(attempts: I) -> Self
    where
        I: IntoIterator<Item = &'a DeliveryAttempt>,
    {
        let mut stats = Self::default();
        for attempt in attempts {
            stats.record(attempt);
        }
        stats
    }

    pub fn record(&mut self, attempt: &DeliveryAttempt) {
        self.customers
            .entry(customer_key(&attempt.customer))
            .or_default()
            .record(attempt);
    }

    pub fn customer(&self, name: &str) -> Option<&CustomerStats> {
        self.customers.get(&customer_key(name))
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }
}

/// Input for a slot ranking
#[derive(Debug, Clone)]
pub struct PredictionQuery {
    pub customer: String,
    pub day: Day,
    pub top_k: usize,
    /// Local time used to drop slots that have already passed today
    pub now: NaiveDateTime,
}

/// One ranked slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotPrediction {
    pub time: String,
    pub failure_rate: f64,
}

impl SlotPrediction {
    pub fn no_data() -> Self {
        Self {
            time: NO_DATA_LABEL.to_string(),
            failure_rate: NO_DATA_FAILURE_RATE,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.time == NO_DATA_LABEL
    }
}

/// Rank a customer's slots for the query day, lowest presented failure rate first.
///
/// Customers without history get a single [`SlotPrediction::no_data`] entry.
pub fn predict_optimal_times<R>(
    stats: &SuccessStats,
    query: &PredictionQuery,
    rng: &mut R,
) -> Vec<SlotPrediction>
where
    R: Rng + ?Sized,
{
    let Some(customer) = stats.customer(&query.customer) else {
        return vec![SlotPrediction::no_data()];
    };

    let mut ranked = customer.scored_slots(query.day);
    if ranked.is_empty() {
        return vec![SlotPrediction::no_data()];
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let is_today = Day::of(&query.now) == query.day;
    let mut kept: Vec<(TimeSlot, f64)> = ranked
        .iter()
        .copied()
        .filter(|(slot, _)| !is_today || !slot.has_passed(&query.now))
        .collect();

    if kept.len() < query.top_k {
        for &(slot, score) in &ranked {
            if kept.len() >= query.top_k {
                break;
            }
            if !kept.iter().any(|(k, _)| *k == slot) {
                kept.push((slot, score));
            }
        }
    }
    kept.truncate(query.top_k);

    let mut predictions: Vec<SlotPrediction> = kept
        .into_iter()
        .map(|(slot, score)| SlotPrediction {
            time: slot.to_string(),
            failure_rate: present_failure_rate(score, rng),
        })
        .collect();
    predictions.sort_by(|a, b| a.failure_rate.total_cmp(&b.failure_rate));
    predictions
}

/// Map a success ratio to the failure percentage shown to the courier.
///
/// Always within [2, 10] and rounded to one decimal.
pub fn present_failure_rate<R>(success_ratio: f64, rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    let base = 100.0 - success_ratio * 100.0;
    let adjusted = if base < 1.0 {
        rng.gen_range(2.0..=6.0)
    } else {
        let scaled = base * 1.5;
        if scaled < 2.0 {
            rng.gen_range(2.0..=4.0)
        } else {
            scaled.min(10.0)
        }
    };
    (adjusted * 10.0).round() / 10.0
}
