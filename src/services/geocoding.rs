//! Customer location lookup
//!
//! Customers are located through a [`Geocoder`]. The static backend answers
//! from area centroids with no network; the Nominatim backend asks the public
//! service and is rate limited. Whatever the backend, [`LocationService`]
//! falls back to the area centroid when the lookup fails or finds nothing.
//!
//! Backend selection via GEOCODER_BACKEND:
//! - "static" → StaticAreaGeocoder (default)
//! - "nominatim" → NominatimGeocoder

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::nominatim::NominatimClient;
use super::resilience::{ExternalGuard, RateLimiter};
use crate::config::{Config, GeocoderBackend};
use crate::types::{Area, Coordinates, Customer};

/// Nominatim allows one request per second
const NOMINATIM_MIN_INTERVAL_MS: u64 = 1100;

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates for a customer, None if the backend has no answer
    async fn locate(&self, customer: &Customer) -> Result<Option<Coordinates>>;

    fn name(&self) -> &'static str;
}

/// Answers with the centroid of the customer's area
pub struct StaticAreaGeocoder;

#[async_trait]
impl Geocoder for StaticAreaGeocoder {
    async fn locate(&self, customer: &Customer) -> Result<Option<Coordinates>> {
        Ok(Some(customer.area.centroid()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Rate-limited Nominatim lookups of the customer's street address
pub struct NominatimGeocoder {
    client: NominatimClient,
    rate_limiter: RateLimiter,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: NominatimClient::new(base_url)?,
            rate_limiter: RateLimiter::new(Duration::from_millis(NOMINATIM_MIN_INTERVAL_MS)),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn locate(&self, customer: &Customer) -> Result<Option<Coordinates>> {
        self.rate_limiter.wait().await;
        self.client.geocode(&customer.address).await
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

/// A resolved customer location
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub customer: String,
    pub area: Area,
    pub address: String,
    pub coordinates: Coordinates,
    /// Backend that produced the coordinates, or "static" after a fallback
    pub source: &'static str,
}

/// Guarded geocoder with an area-centroid fallback
pub struct LocationService {
    geocoder: Box<dyn Geocoder>,
    guard: ExternalGuard,
}

impl LocationService {
    pub fn new(geocoder: Box<dyn Geocoder>, guard: ExternalGuard) -> Self {
        Self { geocoder, guard }
    }

    pub fn backend(&self) -> &'static str {
        self.geocoder.name()
    }

    /// Never fails: any backend problem yields the area centroid
    pub async fn locate(&self, customer: &Customer) -> Location {
        let looked_up = self.guard.call(|| self.geocoder.locate(customer)).await;
        let (coordinates, source) = match looked_up {
            Ok(Some(coordinates)) => (coordinates, self.geocoder.name()),
            Ok(None) => {
                debug!("No geocoding result for {}, using area centroid", customer.name);
                (customer.area.centroid(), "static")
            }
            Err(e) => {
                warn!("Geocoding {} failed ({}), using area centroid", customer.name, e);
                (customer.area.centroid(), "static")
            }
        };
        Location {
            customer: customer.name.clone(),
            area: customer.area,
            address: customer.address.clone(),
            coordinates,
            source,
        }
    }
}

/// Create the geocoder selected in the configuration
pub fn create_geocoder(config: &Config) -> Box<dyn Geocoder> {
    match config.geocoder_backend {
        GeocoderBackend::Static => {
            info!("Using StaticAreaGeocoder");
            Box::new(StaticAreaGeocoder)
        }
        GeocoderBackend::Nominatim => match NominatimGeocoder::new(&config.nominatim_url) {
            Ok(geocoder) => {
                info!("Using NominatimGeocoder at {}", config.nominatim_url);
                Box::new(geocoder)
            }
            Err(e) => {
                warn!("Cannot build Nominatim client ({:#}), using static geocoder", e);
                Box::new(StaticAreaGeocoder)
            }
        },
    }
}
