//! Guards for calls to external services
//!
//! Every outbound call (geocoding, chat, conditions) goes through an
//! [`ExternalGuard`]: the circuit breaker short-circuits a failing service and
//! the timeout bounds how long a request can wait on it.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::{PlannerError, PlannerResult};

// ==========================================================================
// CircuitBreaker
// ==========================================================================

/// Stops calling a service after `threshold` consecutive failures until
/// `recovery_time` has passed since the last one
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    threshold: u32,
    last_failure: Mutex<Option<Instant>>,
    recovery_time: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            threshold: threshold.max(1),
            last_failure: Mutex::new(None),
            recovery_time,
        }
    }

    /// Open means calls are rejected without trying
    pub fn is_open(&self) -> bool {
        if self.failure_count.load(Ordering::Relaxed) < self.threshold {
            return false;
        }
        match *self.last_failure.lock() {
            // Closed again once recovery_time passes; the next failure reopens it
            Some(last) => last.elapsed() < self.recovery_time,
            None => true,
        }
    }

    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        *self.last_failure.lock() = Some(Instant::now());
    }

    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub fn failures(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }
}

// ==========================================================================
// RateLimiter
// ==========================================================================

/// Minimum interval between consecutive calls
pub struct RateLimiter {
    last_call: tokio::sync::Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: tokio::sync::Mutex::new(None),
            min_interval,
        }
    }

    /// Sleep until another call is allowed
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// ==========================================================================
// ExternalGuard
// ==========================================================================

/// Breaker plus timeout for one named external service
pub struct ExternalGuard {
    name: &'static str,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl ExternalGuard {
    pub fn new(name: &'static str, timeout: Duration, threshold: u32, recovery: Duration) -> Self {
        Self {
            name,
            breaker: CircuitBreaker::new(threshold, recovery),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Run `call` unless the breaker is open. Errors and timeouts count as failures.
    pub async fn call<T, F, Fut>(&self, call: F) -> PlannerResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if self.breaker.is_open() {
            warn!("Circuit breaker for {} is open, skipping call", self.name);
            return Err(PlannerError::ExternalUnavailable(self.name));
        }

        match tokio::time::timeout(self.timeout, call()).await {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                self.breaker.record_failure();
                warn!("{} call failed: {:#}", self.name, e);
                Err(PlannerError::ExternalFailed {
                    service: self.name,
                    message: format!("{:#}", e),
                })
            }
            Err(_) => {
                self.breaker.record_failure();
                warn!("{} call timed out after {:?}", self.name, self.timeout);
                Err(PlannerError::ExternalTimeout {
                    service: self.name,
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}
