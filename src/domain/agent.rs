use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BrokerError;

/// Agent role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// Route manager (MRA), sorted first
    #[serde(rename = "mra")]
    RouteManager,
    /// Dispatcher (DA), one per vehicle
    #[serde(rename = "da")]
    Dispatcher,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::RouteManager => "mra",
            AgentKind::Dispatcher => "da",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mra" | "route_manager" | "routemanager" => Ok(AgentKind::RouteManager),
            "da" | "dispatcher" => Ok(AgentKind::Dispatcher),
            other => Err(BrokerError::validation(format!(
                "agent_type must be 'mra' or 'da', got '{}'",
                other
            ))),
        }
    }
}

/// Liveness reported by the agent itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Active,
    Inactive,
    Terminated,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Active => "active",
            AgentState::Inactive => "inactive",
            AgentState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentState {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AgentState::Active),
            "inactive" => Ok(AgentState::Inactive),
            "terminated" => Ok(AgentState::Terminated),
            other => Err(BrokerError::validation(format!(
                "status must be one of active, inactive, terminated, got '{}'",
                other
            ))),
        }
    }
}

/// Last-known status of one agent; replaced wholesale on every update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub status: AgentState,
    #[serde(rename = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub info: Map<String, Value>,
}

impl AgentStatusRecord {
    pub fn is_active(&self) -> bool {
        self.status == AgentState::Active
    }
}

/// Sorted registry snapshot with active counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusSummary {
    pub agents: Vec<AgentStatusRecord>,
    pub mra_count: usize,
    pub da_count: usize,
    pub total_active: usize,
}

impl AgentStatusSummary {
    /// Route managers first, then dispatchers, each alphabetical by name
    pub fn from_records(mut agents: Vec<AgentStatusRecord>) -> Self {
        agents.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));

        let active_of = |kind: AgentKind| {
            agents
                .iter()
                .filter(|a| a.kind == kind && a.is_active())
                .count()
        };
        let mra_count = active_of(AgentKind::RouteManager);
        let da_count = active_of(AgentKind::Dispatcher);
        let total_active = agents.iter().filter(|a| a.is_active()).count();

        Self {
            agents,
            mra_count,
            da_count,
            total_active,
        }
    }
}
