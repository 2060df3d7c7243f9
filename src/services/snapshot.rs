//! Pending-order snapshot
//!
//! The full pending list as pretty JSON, rewritten after every change.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::PlannerResult;
use crate::types::PendingOrder;

#[derive(Debug, Clone)]
pub struct PendingSnapshot {
    path: PathBuf,
}

impl PendingSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Missing file means no pending orders
    pub fn load(&self) -> PlannerResult<Vec<PendingOrder>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let orders: Vec<PendingOrder> = serde_json::from_str(&content)?;
        info!("Loaded {} pending orders from {}", orders.len(), self.path.display());
        Ok(orders)
    }

    /// Write to a sibling temp file, then rename over the snapshot
    pub fn save(&self, orders: &[PendingOrder]) -> PlannerResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(orders)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved {} pending orders", orders.len());
        Ok(())
    }
}
