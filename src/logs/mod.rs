//! Log-derived fleet state.
//!
//! Agents are separate processes whose only structured output is their
//! conversation log. This module turns those logs back into events and
//! folds the events into fleet views.

pub mod aggregator;
pub mod directory;
pub mod entry;
pub mod events;
pub mod extractor;

pub use aggregator::{
    CommunicationView, DispatcherState, DispatcherStatus, FleetStateAggregator, MovementView,
    QueueStatus, RouteManagerState, RouteManagerStatus, SystemState, SystemStateView,
};
pub use directory::{AgentLogFile, LogDirectory};
pub use entry::{parse_entries, EntryLevel, LogEntry};
pub use events::*;
pub use extractor::{events_from_entries, extract_events};
