//! Coordination Layer
//!
//! In-memory state shared between the frontend, the polling agents and
//! observers:
//! - Request ledger with exactly-once claim
//! - One-shot fleet config mailbox
//! - Agent status registry
//! - Vehicle telemetry table

pub mod ledger;
pub mod mailbox;
pub mod registry;
pub mod store;
pub mod telemetry;

pub use ledger::{RequestCounts, RequestLedger};
pub use mailbox::OneShotMailbox;
pub use registry::AgentRegistry;
pub use store::CoordinationStore;
pub use telemetry::TelemetryTable;
