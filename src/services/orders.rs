//! Order book
//!
//! Pending orders, the attempt log and the estimator statistics live behind
//! one lock. Every mutation writes the snapshot first, then the log, and
//! only then touches memory. A failed log append restores the previous
//! snapshot, so a failed write leaves the book unchanged.

use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, warn};

use super::estimator::{predict_optimal_times, PredictionQuery, SlotPrediction, SuccessStats};
use super::history::AttemptLog;
use super::snapshot::PendingSnapshot;
use crate::defaults::{ATTEMPT_LOG_FILE, PENDING_SNAPSHOT_FILE};
use crate::error::{PlannerError, PlannerResult};
use crate::types::{
    Area, CustomerDirectory, CustomerParcels, Day, DeliveryAttempt, DeliveryOutcome,
    DeliveryReport, HistoryResponse, NewOrder, OrderId, OrderStatus, OrderView, Outcome,
    PendingOrder, StopSet, TimeSlot, FIRST_ORDER_NUMBER,
};

/// Orders may be booked for today and the next two days
const BOOKING_WINDOW_DAYS: u32 = 2;

/// Ranked slots for a customer plus context for display
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub customer: String,
    pub day: Day,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_success_rate: Option<f64>,
    pub predictions: Vec<SlotPrediction>,
}

/// Counts used by status lines and the chat context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub pending: usize,
    pub ready: usize,
    pub attempts: usize,
    pub customers_with_history: usize,
}

struct BookState {
    pending: Vec<PendingOrder>,
    log: AttemptLog,
    stats: SuccessStats,
    next_id: OrderId,
}

impl BookState {
    fn position(&self, id: OrderId) -> PlannerResult<usize> {
        self.pending
            .iter()
            .position(|o| o.order_id == id)
            .ok_or_else(|| PlannerError::OrderNotFound(id.to_string()))
    }
}

pub struct OrderBook {
    directory: CustomerDirectory,
    snapshot: PendingSnapshot,
    max_attempts: u32,
    state: RwLock<BookState>,
}

impl OrderBook {
    /// Load the attempt log and the pending snapshot from `data_dir`
    pub fn open(
        directory: CustomerDirectory,
        data_dir: &Path,
        max_attempts: u32,
    ) -> PlannerResult<Self> {
        let log = AttemptLog::open(data_dir.join(ATTEMPT_LOG_FILE))?;
        let stats = SuccessStats::from_attempts(log.attempts());
        let snapshot = PendingSnapshot::new(data_dir.join(PENDING_SNAPSHOT_FILE));
        let pending = snapshot.load()?;

        let next_id = pending
            .iter()
            .map(|o| o.order_id)
            .max()
            .map(OrderId::next)
            .unwrap_or(OrderId::new(FIRST_ORDER_NUMBER));

        info!(
            "Order book ready: {} pending, {} attempts for {} customers, next id {}",
            pending.len(),
            log.len(),
            stats.customer_count(),
            next_id
        );
        if log.is_empty() {
            info!("Attempt log is empty, predictions report no data until deliveries are recorded");
        }

        Ok(Self {
            directory,
            snapshot,
            max_attempts: max_attempts.max(1),
            state: RwLock::new(BookState {
                pending,
                log,
                stats,
                next_id,
            }),
        })
    }

    pub fn directory(&self) -> &CustomerDirectory {
        &self.directory
    }

    pub(crate) fn view(&self, order: &PendingOrder) -> OrderView {
        let address = self
            .directory
            .get(&order.customer)
            .map(|c| c.address.as_str())
            .unwrap_or_default();
        order.view(address)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn list_pending(&self) -> Vec<OrderView> {
        let state = self.state.read();
        state.pending.iter().map(|o| self.view(o)).collect()
    }

    pub fn orders_for_day(&self, day: Day) -> Vec<OrderView> {
        let state = self.state.read();
        state
            .pending
            .iter()
            .filter(|o| o.delivery_day == day)
            .map(|o| self.view(o))
            .collect()
    }

    /// Today's orders grouped per customer, in order of first appearance
    pub fn todays_parcels(&self, now: &NaiveDateTime) -> Vec<CustomerParcels> {
        let mut groups: Vec<CustomerParcels> = Vec::new();
        for order in self.orders_for_day(Day::of(now)) {
            match groups.iter_mut().find(|g| g.customer == order.customer) {
                Some(group) => {
                    group.parcel_count += 1;
                    group.orders.push(order);
                }
                None => groups.push(CustomerParcels {
                    customer: order.customer.clone(),
                    area: order.area,
                    address: order.address.clone(),
                    parcel_count: 1,
                    orders: vec![order],
                }),
            }
        }
        groups
    }

    /// Stop set for today's pending orders
    pub fn todays_stops(&self, now: &NaiveDateTime) -> StopSet {
        let mut stops = StopSet::new();
        for group in self.todays_parcels(now) {
            stops.add(&group.customer, group.parcel_count);
        }
        stops
    }

    /// Stop set for explicit order ids
    pub fn stops_for_orders<S: AsRef<str>>(&self, ids: &[S]) -> PlannerResult<StopSet> {
        let state = self.state.read();
        let mut stops = StopSet::new();
        for raw in ids {
            let id: OrderId = raw.as_ref().parse()?;
            let index = state.position(id)?;
            stops.add(&state.pending[index].customer, 1);
        }
        Ok(stops)
    }

    pub fn summary(&self) -> BookSummary {
        let state = self.state.read();
        BookSummary {
            pending: state.pending.len(),
            ready: state
                .pending
                .iter()
                .filter(|o| o.status == OrderStatus::Ready)
                .count(),
            attempts: state.log.len(),
            customers_with_history: state.stats.customer_count(),
        }
    }

    /// Most recent attempts, newest first
    pub fn history(&self, customer: Option<&str>, limit: usize) -> HistoryResponse {
        let state = self.state.read();
        let attempts = state.log.recent(customer, limit);
        HistoryResponse {
            total: attempts.len(),
            attempts,
        }
    }

    /// Rank delivery slots. Unknown customers get the no-data sentinel.
    pub fn predict<R>(&self, query: &PredictionQuery, rng: &mut R) -> PredictionReport
    where
        R: Rng + ?Sized,
    {
        let customer = self.directory.get(&query.customer);
        let state = self.state.read();
        let predictions = predict_optimal_times(&state.stats, query, rng);
        let day_success_rate = state
            .stats
            .customer(&query.customer)
            .and_then(|stats| stats.day_ratio(query.day))
            .map(|ratio| (ratio * 1000.0).round() / 10.0);

        PredictionReport {
            customer: customer.map_or_else(|| query.customer.trim().to_string(), |c| c.name.clone()),
            day: query.day,
            area: customer.map(|c| c.area),
            day_success_rate,
            predictions,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Validate and book a new order
    pub fn place_order<R>(
        &self,
        new_order: NewOrder,
        now: &NaiveDateTime,
        rng: &mut R,
    ) -> PlannerResult<PendingOrder>
    where
        R: Rng + ?Sized,
    {
        let customer = self.directory.resolve(&new_order.customer)?;
        let today = Day::of(now);

        if today.days_until(new_order.delivery_day) > BOOKING_WINDOW_DAYS {
            let allowed: Vec<&str> = (0..=BOOKING_WINDOW_DAYS)
                .scan(today, |day, _| {
                    let current = *day;
                    *day = day.succ();
                    Some(current.as_str())
                })
                .collect();
            return Err(PlannerError::DayOutsideWindow {
                day: new_order.delivery_day.to_string(),
                allowed: allowed.join(", "),
            });
        }

        if let Some(slot) = new_order.time_slot {
            if !slot.is_service_slot() {
                return Err(PlannerError::InvalidTimeSlot(slot.to_string()));
            }
            if new_order.delivery_day == today && slot.has_passed(now) {
                return Err(PlannerError::SlotPassed(slot.to_string()));
            }
        }

        let verification_code = format!("{:04}", rng.gen_range(0..10_000u32));

        let mut state = self.state.write();
        let order = PendingOrder {
            order_id: state.next_id,
            customer: customer.name.clone(),
            delivery_day: new_order.delivery_day,
            area: customer.area,
            package_size: new_order.package_size,
            time_slot: new_order.time_slot,
            status: OrderStatus::Pending,
            failed_attempts: 0,
            verification_code,
            created_at: Utc::now(),
        };

        let mut pending = state.pending.clone();
        pending.push(order.clone());
        self.snapshot.save(&pending)?;

        state.pending = pending;
        state.next_id = order.order_id.next();
        info!(
            "Placed order {} for {} on {}",
            order.order_id, order.customer, order.delivery_day
        );
        Ok(order)
    }

    /// Pending → Ready
    pub fn mark_ready(&self, id: OrderId) -> PlannerResult<PendingOrder> {
        let mut state = self.state.write();
        let index = state.position(id)?;
        let current = &state.pending[index];
        if current.status != OrderStatus::Pending {
            return Err(PlannerError::InvalidTransition {
                id: id.to_string(),
                from: current.status.to_string(),
                to: OrderStatus::Ready.to_string(),
            });
        }

        let mut pending = state.pending.clone();
        pending[index].status = OrderStatus::Ready;
        self.snapshot.save(&pending)?;

        let order = pending[index].clone();
        state.pending = pending;
        info!("Order {} ready for delivery", id);
        Ok(order)
    }

    /// Record the outcome of a delivery attempt.
    ///
    /// Success removes the order. Failure carries it to the next day until the
    /// attempt limit is reached, then removes it. Either way exactly one
    /// attempt is appended to the log.
    pub fn record_delivery(
        &self,
        id: OrderId,
        report: DeliveryReport,
        now: &NaiveDateTime,
    ) -> PlannerResult<DeliveryOutcome> {
        let mut state = self.state.write();
        let index = state.position(id)?;
        let order = state.pending[index].clone();

        if !order.status.is_open() {
            let to = if report.success {
                OrderStatus::Success
            } else {
                OrderStatus::Fail
            };
            return Err(PlannerError::InvalidTransition {
                id: id.to_string(),
                from: order.status.to_string(),
                to: to.to_string(),
            });
        }

        if report.success {
            if let Some(code) = report.verification_code.as_deref() {
                if code.trim() != order.verification_code {
                    warn!("Verification code mismatch for order {}", id);
                    return Err(PlannerError::VerificationFailed(id.to_string()));
                }
            }
        }

        let attempt = DeliveryAttempt {
            customer: order.customer.clone(),
            day: order.delivery_day,
            time_slot: report.time_slot.unwrap_or_else(|| TimeSlot::containing(now)),
            area: order.area,
            package_size: order.package_size,
            outcome: Outcome::from_success(report.success),
        };

        let mut pending = state.pending.clone();
        let outcome = if report.success {
            let mut done = pending.remove(index);
            done.status = OrderStatus::Success;
            DeliveryOutcome::Delivered {
                order: done,
                attempt: attempt.clone(),
            }
        } else if order.failed_attempts + 1 >= self.max_attempts {
            let mut dropped = pending.remove(index);
            dropped.failed_attempts += 1;
            dropped.status = OrderStatus::Fail;
            DeliveryOutcome::Abandoned {
                order: dropped,
                attempt: attempt.clone(),
            }
        } else {
            let carried = &mut pending[index];
            carried.failed_attempts += 1;
            carried.delivery_day = carried.delivery_day.succ();
            carried.status = OrderStatus::Pending;
            DeliveryOutcome::Rescheduled {
                order: carried.clone(),
                attempt: attempt.clone(),
            }
        };

        // Snapshot before log; a failed append restores the previous snapshot
        self.snapshot.save(&pending)?;
        if let Err(e) = state.log.append(attempt.clone()) {
            if let Err(restore) = self.snapshot.save(&state.pending) {
                error!(
                    "Cannot restore pending snapshot after failed log append for {}: {}",
                    id, restore
                );
            }
            return Err(e);
        }

        state.pending = pending;
        state.stats.record(&attempt);

        match &outcome {
            DeliveryOutcome::Delivered { .. } => info!("Order {} delivered", id),
            DeliveryOutcome::Rescheduled { order, .. } => info!(
                "Order {} failed, moved to {} (attempt {})",
                id, order.delivery_day, order.failed_attempts
            ),
            DeliveryOutcome::Abandoned { order, .. } => warn!(
                "Order {} dropped after {} failed attempts",
                id, order.failed_attempts
            ),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageSize;
    use chrono::{NaiveDate, Weekday};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;

    // 2024-06-10 was a Monday
    fn monday_at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(hour, 5, 0)
            .unwrap()
    }

    fn book(dir: &Path) -> OrderBook {
        OrderBook::open(CustomerDirectory::ahmedabad(), dir, 3).unwrap()
    }

    fn new_order(name: &str, day: Weekday, slot: Option<&str>) -> NewOrder {
        NewOrder {
            customer: name.to_string(),
            delivery_day: Day::new(day),
            package_size: PackageSize::Small,
            time_slot: slot.map(|s| s.parse().unwrap()),
        }
    }

    fn failed() -> DeliveryReport {
        DeliveryReport {
            success: false,
            ..Default::default()
        }
    }

    // ========================================================================
    // Placement
    // ========================================================================

    #[test]
    fn ids_start_at_1001_and_increase() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(1);
        let now = monday_at(8);

        let first = book
            .place_order(new_order("aditya", Weekday::Mon, None), &now, &mut rng)
            .unwrap();
        let second = book
            .place_order(new_order("Meera", Weekday::Tue, Some("2 PM")), &now, &mut rng)
            .unwrap();

        assert_eq!(first.order_id.to_string(), "ORD1001");
        assert_eq!(second.order_id.to_string(), "ORD1002");
        assert_eq!(first.customer, "Aditya");
        assert_eq!(first.area, Area::Satellite);
        assert_eq!(first.verification_code.len(), 4);
        assert!(first.verification_code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn placement_rejects_unknown_customer() {
        let dir = tempfile::tempdir().unwrap();
        let err = book(dir.path())
            .place_order(
                new_order("Zed", Weekday::Mon, None),
                &monday_at(8),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(err.is_unknown_entity());
    }

    #[test]
    fn placement_enforces_booking_window() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(1);
        let now = monday_at(8);

        assert!(book
            .place_order(new_order("Riya", Weekday::Wed, None), &now, &mut rng)
            .is_ok());
        let err = book
            .place_order(new_order("Riya", Weekday::Thu, None), &now, &mut rng)
            .unwrap_err();
        match err {
            PlannerError::DayOutsideWindow { allowed, .. } => {
                assert_eq!(allowed, "Monday, Tuesday, Wednesday")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn placement_rejects_passed_and_off_hours_slots() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(1);
        let now = monday_at(14);

        let passed = book
            .place_order(new_order("Riya", Weekday::Mon, Some("2 PM")), &now, &mut rng)
            .unwrap_err();
        assert!(matches!(passed, PlannerError::SlotPassed(_)));

        let off_hours = book
            .place_order(new_order("Riya", Weekday::Tue, Some("7 AM")), &now, &mut rng)
            .unwrap_err();
        assert!(matches!(off_hours, PlannerError::InvalidTimeSlot(_)));

        // Same slot on another day is fine
        assert!(book
            .place_order(new_order("Riya", Weekday::Tue, Some("2 PM")), &now, &mut rng)
            .is_ok());
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn deliver_removes_order_and_logs_once() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(5);
        let now = monday_at(9);

        let order = book
            .place_order(new_order("Meera", Weekday::Mon, Some("3 PM")), &now, &mut rng)
            .unwrap();
        let outcome = book
            .record_delivery(
                order.order_id,
                DeliveryReport {
                    success: true,
                    verification_code: Some(order.verification_code.clone()),
                    time_slot: Some("3 PM".parse().unwrap()),
                },
                &monday_at(15),
            )
            .unwrap();

        assert!(matches!(outcome, DeliveryOutcome::Delivered { .. }));
        assert_eq!(outcome.order().status, OrderStatus::Success);
        assert!(book.list_pending().is_empty());

        let history = book.history(None, 10);
        assert_eq!(history.total, 1);
        let logged = &history.attempts[0];
        assert_eq!(logged.customer, "Meera");
        assert_eq!(logged.day, Day::new(Weekday::Mon));
        assert_eq!(logged.area, Area::Paldi);
        assert_eq!(logged.outcome, Outcome::Success);
        assert_eq!(logged, outcome.attempt());
    }

    #[test]
    fn failed_snapshot_write_logs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(5);
        let order = book
            .place_order(new_order("Meera", Weekday::Mon, None), &monday_at(9), &mut rng)
            .unwrap();
        let report = DeliveryReport {
            success: true,
            verification_code: Some(order.verification_code.clone()),
            time_slot: Some("3 PM".parse().unwrap()),
        };

        // A directory where the temp file goes makes the snapshot write fail
        let blocker = dir.path().join(PENDING_SNAPSHOT_FILE).with_extension("json.tmp");
        fs::create_dir(&blocker).unwrap();
        let err = book
            .record_delivery(order.order_id, report.clone(), &monday_at(15))
            .unwrap_err();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(book.list_pending().len(), 1);
        assert_eq!(book.summary().attempts, 0);
        assert_eq!(book.summary().customers_with_history, 0);
        assert!(!dir.path().join(ATTEMPT_LOG_FILE).exists());

        fs::remove_dir(&blocker).unwrap();
        book.record_delivery(order.order_id, report, &monday_at(15)).unwrap();
        assert!(book.list_pending().is_empty());
        assert_eq!(book.summary().attempts, 1);

        let reopened = OrderBook::open(CustomerDirectory::ahmedabad(), dir.path(), 3).unwrap();
        assert_eq!(reopened.history(Some("Meera"), 10).total, 1);
        assert!(reopened.list_pending().is_empty());
    }

    #[test]
    fn delivery_defaults_to_current_hour_slot() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let order = book
            .place_order(
                new_order("Kabir", Weekday::Mon, None),
                &monday_at(9),
                &mut StdRng::seed_from_u64(2),
            )
            .unwrap();
        let outcome = book
            .record_delivery(order.order_id, DeliveryReport { success: true, ..Default::default() }, &monday_at(16))
            .unwrap();
        assert_eq!(outcome.attempt().time_slot.to_string(), "4 PM");
    }

    #[test]
    fn verification_mismatch_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let now = monday_at(9);
        let order = book
            .place_order(new_order("Diya", Weekday::Mon, None), &now, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let wrong = if order.verification_code == "0000" { "1111" } else { "0000" };

        let err = book
            .record_delivery(
                order.order_id,
                DeliveryReport {
                    success: true,
                    verification_code: Some(wrong.to_string()),
                    time_slot: None,
                },
                &now,
            )
            .unwrap_err();

        assert!(matches!(err, PlannerError::VerificationFailed(_)));
        assert_eq!(book.list_pending().len(), 1);
        assert_eq!(book.summary().attempts, 0);
    }

    #[test]
    fn failure_reschedules_then_abandons() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let now = monday_at(9);
        let order = book
            .place_order(new_order("Aryan", Weekday::Mon, None), &now, &mut StdRng::seed_from_u64(4))
            .unwrap();

        let first = book.record_delivery(order.order_id, failed(), &now).unwrap();
        match &first {
            DeliveryOutcome::Rescheduled { order: carried, .. } => {
                assert_eq!(carried.order_id, order.order_id);
                assert_eq!(carried.delivery_day, Day::new(Weekday::Tue));
                assert_eq!(carried.failed_attempts, 1);
                assert_eq!(carried.status, OrderStatus::Pending);
            }
            other => panic!("expected reschedule, got {:?}", other),
        }

        book.record_delivery(order.order_id, failed(), &now).unwrap();
        let last = book.record_delivery(order.order_id, failed(), &now).unwrap();
        assert!(matches!(last, DeliveryOutcome::Abandoned { .. }));
        assert_eq!(last.order().failed_attempts, 3);
        assert!(book.list_pending().is_empty());
        assert_eq!(book.summary().attempts, 3);

        let err = book.record_delivery(order.order_id, failed(), &now).unwrap_err();
        assert!(matches!(err, PlannerError::OrderNotFound(_)));
    }

    #[test]
    fn ready_is_one_way() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let now = monday_at(9);
        let order = book
            .place_order(new_order("Ananya", Weekday::Mon, None), &now, &mut StdRng::seed_from_u64(6))
            .unwrap();

        let ready = book.mark_ready(order.order_id).unwrap();
        assert_eq!(ready.status, OrderStatus::Ready);
        assert_eq!(book.summary().ready, 1);

        let err = book.mark_ready(order.order_id).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidTransition { .. }));

        // Delivery is still allowed from Ready
        let outcome = book
            .record_delivery(order.order_id, DeliveryReport { success: true, ..Default::default() }, &now)
            .unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Delivered { .. }));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = book(dir.path()).mark_ready(OrderId::new(42)).unwrap_err();
        assert_eq!(err.code(), "ORDER_NOT_FOUND");
    }

    // ========================================================================
    // Grouping, prediction and persistence
    // ========================================================================

    #[test]
    fn todays_orders_group_into_stops() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(8);
        let now = monday_at(8);
        for (name, day) in [
            ("Meera", Weekday::Mon),
            ("Aditya", Weekday::Mon),
            ("Meera", Weekday::Mon),
            ("Riya", Weekday::Tue),
        ] {
            book.place_order(new_order(name, day, None), &now, &mut rng).unwrap();
        }

        let groups = book.todays_parcels(&now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].customer, "Meera");
        assert_eq!(groups[0].parcel_count, 2);
        assert_eq!(groups[0].orders.len(), 2);

        let stops = book.todays_stops(&now);
        assert_eq!(stops.total_parcels(), 3);
        assert_eq!(stops.len(), 2);

        let by_id = book.stops_for_orders(&["ORD1004", "ord1001"]).unwrap();
        assert_eq!(by_id.iter().collect::<Vec<_>>(), vec![("Riya", 1), ("Meera", 1)]);
        assert!(book.stops_for_orders(&["ORD9999"]).is_err());
    }

    #[test]
    fn delivered_attempts_feed_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let book = book(dir.path());
        let mut rng = StdRng::seed_from_u64(9);
        let now = monday_at(8);
        let query = PredictionQuery {
            customer: "Ishaan".to_string(),
            day: Day::new(Weekday::Tue),
            top_k: 3,
            now,
        };
        assert!(book.predict(&query, &mut rng).predictions[0].is_no_data());

        let order = book
            .place_order(new_order("Ishaan", Weekday::Mon, None), &now, &mut rng)
            .unwrap();
        book.record_delivery(order.order_id, DeliveryReport { success: true, ..Default::default() }, &monday_at(11))
            .unwrap();

        let report = book.predict(&query, &mut rng);
        assert_eq!(report.area, Some(Area::Maninagar));
        assert_eq!(report.predictions.len(), 1);
        assert_eq!(report.predictions[0].time, "11 AM");
        assert!(report.day_success_rate.is_none());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let now = monday_at(8);
        let mut rng = StdRng::seed_from_u64(10);
        {
            let book = book(dir.path());
            let delivered = book
                .place_order(new_order("Vivaan", Weekday::Mon, None), &now, &mut rng)
                .unwrap();
            book.place_order(new_order("Aarav", Weekday::Tue, None), &now, &mut rng)
                .unwrap();
            book.record_delivery(delivered.order_id, failed(), &now).unwrap();
        }

        let reopened = book(dir.path());
        let pending = reopened.list_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].failed_attempts, 1);
        assert_eq!(reopened.summary().attempts, 1);
        assert!(fs::read_to_string(dir.path().join(PENDING_SNAPSHOT_FILE))
            .unwrap()
            .contains("verification_code"));

        let next = reopened
            .place_order(new_order("Aarav", Weekday::Mon, None), &now, &mut rng)
            .unwrap();
        assert_eq!(next.order_id, OrderId::new(1003));
    }
}
