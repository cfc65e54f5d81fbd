//! Fleet State Aggregator
//!
//! Movement, communication and system-state views rebuilt from the agent
//! logs on every call. Nothing is cached: agents keep appending while we
//! read, and a fresh pass is always consistent with what is on disk.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use super::directory::LogDirectory;
use super::events::{
    CommunicationEvent, LogEvent, MovementEvent, ProgressMarker, QueueTrigger,
    RouteLifecycleEvent, RoutePhase,
};
use super::extractor::extract_events;
use crate::domain::AgentKind;
use crate::error::Result;

/// Latest queue observation for one dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    pub queue_size: u32,
    pub current_route: Option<String>,
}

impl QueueStatus {
    /// Last queue or lifecycle observation wins
    pub fn from_events(events: &[LogEvent]) -> Self {
        let mut status = QueueStatus::default();
        for event in events {
            match event {
                LogEvent::Queue(q) => {
                    if let Some(size) = q.queue_size {
                        status.queue_size = size;
                    }
                    if let Some(route) = &q.current_route_id {
                        status.current_route = Some(route.clone());
                    }
                }
                LogEvent::RouteLifecycle(r) if r.phase == RoutePhase::Executing => {
                    status.current_route = Some(r.route_id.clone());
                }
                _ => {}
            }
        }
        status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementView {
    pub movements: BTreeMap<String, Vec<MovementEvent>>,
    pub routes: BTreeMap<String, Vec<RouteLifecycleEvent>>,
    pub queue_status: BTreeMap<String, QueueStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommunicationView {
    pub communications: Vec<CommunicationEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteManagerStatus {
    #[default]
    Unknown,
    Solving,
    Solved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteManagerState {
    pub status: RouteManagerStatus,
    pub vehicles_queried: usize,
    pub routes_assigned: usize,
    pub unserved_customers: u32,
}

impl RouteManagerState {
    pub fn from_events(events: &[LogEvent]) -> Self {
        let mut state = RouteManagerState::default();
        let mut queried = HashSet::new();

        for event in events {
            let LogEvent::Progress(progress) = event else {
                continue;
            };
            match &progress.marker {
                ProgressMarker::VehicleQueried { agent } => {
                    queried.insert(agent.as_str());
                }
                ProgressMarker::RouteAssigning => state.routes_assigned += 1,
                ProgressMarker::UnservedCustomers { count } => state.unserved_customers = *count,
                ProgressMarker::Solving => state.status = RouteManagerStatus::Solving,
                ProgressMarker::SolutionFound => state.status = RouteManagerStatus::Solved,
            }
        }

        state.vehicles_queried = queried.len();
        state
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatcherStatus {
    #[default]
    Idle,
    Queued,
    Executing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherState {
    pub status: DispatcherStatus,
    pub queue_size: u32,
    pub current_route: Option<String>,
    pub routes_completed: usize,
}

impl DispatcherState {
    /// Executing if the latest queue marker is a claim, else Queued when
    /// routes are waiting, else Idle
    pub fn from_events(events: &[LogEvent]) -> Self {
        let queue = QueueStatus::from_events(events);
        let last_trigger = events.iter().rev().find_map(|e| match e {
            LogEvent::Queue(q) => Some(q.trigger),
            _ => None,
        });
        let routes_completed = events
            .iter()
            .filter(|e| {
                matches!(e, LogEvent::RouteLifecycle(r) if r.phase == RoutePhase::Completed)
            })
            .count();

        let status = if last_trigger == Some(QueueTrigger::Claimed) {
            DispatcherStatus::Executing
        } else if queue.queue_size > 0 {
            DispatcherStatus::Queued
        } else {
            DispatcherStatus::Idle
        };

        Self {
            status,
            queue_size: queue.queue_size,
            current_route: queue.current_route,
            routes_completed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemState {
    pub mra: RouteManagerState,
    pub das: BTreeMap<String, DispatcherState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemStateView {
    pub state: SystemState,
}

#[derive(Debug, Clone)]
pub struct FleetStateAggregator {
    directory: LogDirectory,
}

impl FleetStateAggregator {
    pub fn new(directory: LogDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &LogDirectory {
        &self.directory
    }

    /// Events of every dispatcher log in a run, keyed by dispatcher name
    fn dispatcher_events(&self, run: Option<&str>) -> Result<Vec<(String, Vec<LogEvent>)>> {
        Ok(self
            .directory
            .dispatchers(run)?
            .into_iter()
            .map(|file| {
                let events = self
                    .directory
                    .read(&file)
                    .map(|text| extract_events(&text))
                    .unwrap_or_default();
                (file.name, events)
            })
            .collect())
    }

    fn route_manager_events(&self, run: Option<&str>) -> Result<Vec<LogEvent>> {
        let Some(file) = self.directory.find_agent(run, AgentKind::RouteManager.as_str())? else {
            return Ok(Vec::new());
        };
        Ok(self
            .directory
            .read(&file)
            .map(|text| extract_events(&text))
            .unwrap_or_default())
    }

    pub fn movement_view(&self, run: Option<&str>) -> Result<MovementView> {
        let mut view = MovementView::default();

        for (name, events) in self.dispatcher_events(run)? {
            let movements: Vec<MovementEvent> = events
                .iter()
                .filter_map(|e| match e {
                    LogEvent::Movement(m) => Some(m.clone()),
                    _ => None,
                })
                .collect();
            let routes: Vec<RouteLifecycleEvent> = events
                .iter()
                .filter_map(|e| match e {
                    LogEvent::RouteLifecycle(r) => Some(r.clone()),
                    _ => None,
                })
                .collect();

            if !movements.is_empty() {
                view.movements.insert(name.clone(), movements);
            }
            if !routes.is_empty() {
                view.routes.insert(name.clone(), routes);
            }
            view.queue_status
                .insert(name, QueueStatus::from_events(&events));
        }

        Ok(view)
    }

    pub fn communication_view(&self, run: Option<&str>) -> Result<CommunicationView> {
        let communications = self
            .route_manager_events(run)?
            .into_iter()
            .filter_map(|e| match e {
                LogEvent::Communication(c) => Some(c),
                _ => None,
            })
            .collect();
        Ok(CommunicationView { communications })
    }

    pub fn system_state(&self, run: Option<&str>) -> Result<SystemStateView> {
        let mra = RouteManagerState::from_events(&self.route_manager_events(run)?);
        let das = self
            .dispatcher_events(run)?
            .into_iter()
            .map(|(name, events)| (name, DispatcherState::from_events(&events)))
            .collect();

        Ok(SystemStateView {
            state: SystemState { mra, das },
        })
    }
}
