use crate::coordination::CoordinationStore;
use crate::logs::{FleetStateAggregator, LogDirectory};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Request ledger, fleet config mailbox, agent registry and telemetry
    pub store: Arc<CoordinationStore>,

    /// Log-derived views over the shared agent log directory
    pub aggregator: Arc<FleetStateAggregator>,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<CoordinationStore>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            aggregator: Arc::new(FleetStateAggregator::new(LogDirectory::new(logs_dir))),
            start_time: Utc::now(),
        }
    }

    pub fn logs(&self) -> &LogDirectory {
        self.aggregator.directory()
    }

    /// Get system uptime in seconds
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
