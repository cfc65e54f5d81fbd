pub mod adapters;
pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod logs;

pub use adapters::BrokerClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AppConfig;
pub use coordination::CoordinationStore;
pub use error::{BrokerError, Result};
pub use logs::{extract_events, FleetStateAggregator, LogDirectory, LogEvent};
