//! Configuration management

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{self, Context, Result};

use crate::defaults::*;
use crate::types::{Area, Depot};

/// Which geocoder answers location lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocoderBackend {
    /// Area centroids only, no network
    Static,
    Nominatim,
}

impl FromStr for GeocoderBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" | "mock" => Ok(Self::Static),
            "nominatim" => Ok(Self::Nominatim),
            other => anyhow::bail!("unknown geocoder backend '{}' (expected static or nominatim)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,

    /// Directory holding the attempt log and the pending snapshot
    pub data_dir: PathBuf,

    pub depot: Depot,

    /// Default number of slots returned by predictions
    pub top_k: usize,

    /// Failed attempts after which an order is dropped
    pub max_delivery_attempts: u32,

    /// Upper bound for any external call
    pub external_timeout: Duration,
    pub breaker_threshold: u32,
    pub breaker_recovery: Duration,

    pub geocoder_backend: GeocoderBackend,
    pub nominatim_url: String,

    /// Chat assistant key; canned replies when unset
    pub chat_api_key: Option<String>,
    pub chat_api_url: String,
    pub chat_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5003)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            depot: Depot::default(),
            top_k: DEFAULT_TOP_K,
            max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS,
            external_timeout: Duration::from_secs(DEFAULT_EXTERNAL_TIMEOUT_SECS),
            breaker_threshold: DEFAULT_CB_THRESHOLD,
            breaker_recovery: Duration::from_secs(DEFAULT_CB_RECOVERY_SECS),
            geocoder_backend: GeocoderBackend::Static,
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            chat_api_key: None,
            chat_api_url: DEFAULT_CHAT_API_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Build from any key → value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = match lookup("PLANNER_BIND") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid value for PLANNER_BIND: '{}'", raw))?,
            None => DEFAULT_BIND.parse().context("invalid default bind address")?,
        };

        let depot_area: Area = parse_var(&lookup, "DEPOT_AREA", DEFAULT_DEPOT_AREA)?;
        let depot = Depot {
            label: lookup("DEPOT_LABEL").unwrap_or_else(|| DEFAULT_DEPOT_LABEL.to_string()),
            area: depot_area,
        };

        let top_k: usize = parse_var(&lookup, "PLANNER_TOP_K", DEFAULT_TOP_K)?;
        if top_k == 0 {
            anyhow::bail!("PLANNER_TOP_K must be at least 1");
        }

        let max_delivery_attempts: u32 =
            parse_var(&lookup, "MAX_DELIVERY_ATTEMPTS", DEFAULT_MAX_DELIVERY_ATTEMPTS)?;
        if max_delivery_attempts == 0 {
            anyhow::bail!("MAX_DELIVERY_ATTEMPTS must be at least 1");
        }

        let timeout_secs: u64 =
            parse_var(&lookup, "EXTERNAL_TIMEOUT_SECS", DEFAULT_EXTERNAL_TIMEOUT_SECS)?;
        let breaker_threshold: u32 =
            parse_var(&lookup, "EXTERNAL_CB_THRESHOLD", DEFAULT_CB_THRESHOLD)?;
        let recovery_secs: u64 =
            parse_var(&lookup, "EXTERNAL_CB_RECOVERY_SECS", DEFAULT_CB_RECOVERY_SECS)?;

        Ok(Self {
            bind,
            data_dir: lookup("PLANNER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            depot,
            top_k,
            max_delivery_attempts,
            external_timeout: Duration::from_secs(timeout_secs),
            breaker_threshold,
            breaker_recovery: Duration::from_secs(recovery_secs),
            geocoder_backend: parse_var(&lookup, "GEOCODER_BACKEND", GeocoderBackend::Static)?,
            nominatim_url: lookup("NOMINATIM_URL")
                .unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
            chat_api_key: lookup("PERPLEXITY_API_KEY"),
            chat_api_url: lookup("CHAT_API_URL")
                .unwrap_or_else(|| DEFAULT_CHAT_API_URL.to_string()),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        })
    }
}
