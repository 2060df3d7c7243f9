//! Application state shared by the HTTP handlers and the CLI

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use parking_lot::RwLock;
use rand::Rng;
use tracing::info;

use crate::config::Config;
use crate::error::PlannerResult;
use crate::services::chat::{ChatAssistant, ChatContext, CustomerBrief};
use crate::services::conditions::{ConditionsService, SimulatedConditions};
use crate::services::distance::AreaDistanceTable;
use crate::services::estimator::PredictionQuery;
use crate::services::geocoding::{create_geocoder, LocationService};
use crate::services::orders::OrderBook;
use crate::services::resilience::ExternalGuard;
use crate::services::route_optimizer::RouteOptimizer;
use crate::types::{CustomerDirectory, Day, RouteResult};

/// Local wall clock, replaceable in tests
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct AppState {
    pub config: Config,
    pub book: OrderBook,
    pub optimizer: RouteOptimizer,
    pub locations: LocationService,
    pub assistant: ChatAssistant,
    pub conditions: ConditionsService,
    /// Most recent route, used as chat context
    last_route: RwLock<Option<RouteResult>>,
    clock: Clock,
}

impl AppState {
    /// Open the data files and wire every service from `config`
    pub fn new(config: Config) -> PlannerResult<Self> {
        let directory = CustomerDirectory::ahmedabad();
        let book = OrderBook::open(
            directory.clone(),
            &config.data_dir,
            config.max_delivery_attempts,
        )?;
        let optimizer = RouteOptimizer::new(
            directory,
            AreaDistanceTable::ahmedabad(config.depot.area),
            config.depot.clone(),
        );

        let guard = |name| {
            ExternalGuard::new(
                name,
                config.external_timeout,
                config.breaker_threshold,
                config.breaker_recovery,
            )
        };
        let locations = LocationService::new(create_geocoder(&config), guard("geocoder"));
        let assistant = ChatAssistant::from_config(&config, guard("chat"));
        let conditions = ConditionsService::new(Box::new(SimulatedConditions), guard("conditions"));

        info!(
            "Planner state ready (depot: {}, geocoder: {})",
            config.depot.label,
            locations.backend()
        );

        Ok(Self {
            config,
            book,
            optimizer,
            locations,
            assistant,
            conditions,
            last_route: RwLock::new(None),
            clock: Arc::new(|| Local::now().naive_local()),
        })
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn today(&self) -> Day {
        Day::of(&self.now())
    }

    pub fn remember_route(&self, route: &RouteResult) {
        *self.last_route.write() = Some(route.clone());
    }

    pub fn last_route(&self) -> Option<RouteResult> {
        self.last_route.read().clone()
    }

    /// Everything the assistant is told about the current day
    pub fn chat_context<R>(&self, rng: &mut R) -> ChatContext
    where
        R: Rng + ?Sized,
    {
        let now = self.now();
        let today = Day::of(&now);
        let customers = self
            .book
            .directory()
            .iter()
            .map(|customer| {
                let report = self.book.predict(
                    &PredictionQuery {
                        customer: customer.name.clone(),
                        day: today,
                        top_k: 1,
                        now,
                    },
                    rng,
                );
                let best_time = report
                    .predictions
                    .into_iter()
                    .find(|p| !p.is_no_data())
                    .map(|p| (p.time, p.failure_rate));
                CustomerBrief {
                    name: customer.name.clone(),
                    area: customer.area,
                    address: customer.address.clone(),
                    best_time,
                }
            })
            .collect();

        ChatContext {
            today: now.date(),
            customers,
            todays_orders: self.book.orders_for_day(today),
            route: self.last_route(),
        }
    }
}
