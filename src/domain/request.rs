use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BrokerError, Result};

/// Broker-assigned request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Request lifecycle, forward-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Processing,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Processing => "processing",
            RequestStatus::Completed => "completed",
        }
    }

    /// Check if this status can move to `target`
    pub fn can_transition_to(&self, target: RequestStatus) -> bool {
        use RequestStatus::*;

        matches!(
            (self, target),
            (Pending, Processing) | (Processing, Completed) | (Pending, Completed)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer identifier as sent by the frontend (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CustomerId {
    Number(i64),
    Text(String),
}

impl CustomerId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(CustomerId::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(CustomerId::Number),
            _ => None,
        }
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomerId::Number(n) => write!(f, "{}", n),
            CustomerId::Text(s) => f.write_str(s),
        }
    }
}

/// One delivery stop of a routing request
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub demand: f64,
    pub x: f64,
    pub y: f64,
}

/// Validated routing request body.
///
/// The submitted JSON is kept verbatim so agents receive exactly what the
/// frontend submitted; `customers` is the typed view used for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CvrpPayload {
    raw: Value,
    customers: Vec<Customer>,
}

impl CvrpPayload {
    pub fn parse(raw: Value) -> Result<Self> {
        let list = raw
            .get("customers")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                BrokerError::validation("Missing or invalid field: customers (must be array)")
            })?;

        if list.is_empty() {
            return Err(BrokerError::validation("At least one customer required"));
        }

        let mut customers = Vec::with_capacity(list.len());
        for (i, entry) in list.iter().enumerate() {
            let id = entry.get("id").and_then(CustomerId::from_value);
            let demand = entry.get("demand").and_then(Value::as_f64);
            let x = entry.get("x").and_then(Value::as_f64);
            let y = entry.get("y").and_then(Value::as_f64);

            let (Some(id), Some(demand), Some(x), Some(y)) = (id, demand, x, y) else {
                return Err(BrokerError::validation(format!(
                    "Customer {} must have: id, demand, x, y",
                    i
                )));
            };
            if demand < 0.0 {
                return Err(BrokerError::validation(format!(
                    "Customer {} demand cannot be negative: {}",
                    i, demand
                )));
            }
            customers.push(Customer { id, demand, x, y });
        }

        Ok(Self { raw, customers })
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(|c| c.demand).sum()
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

impl Serialize for CvrpPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Opaque solver output attached to a completed request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub payload: Value,
    pub recorded_at: DateTime<Utc>,
}

/// Ledger entry for one submitted request
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub id: RequestId,
    pub payload: CvrpPayload,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub solution: Option<Solution>,
}

/// Work item handed to the polling consumer
#[derive(Debug, Clone, Serialize)]
pub struct ClaimedRequest {
    pub request_id: RequestId,
    pub data: CvrpPayload,
}

/// Answer of a status query for a known request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Pending,
    Processing,
    Completed { solution: Value },
}

impl RequestState {
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestState::Pending => RequestStatus::Pending,
            RequestState::Processing => RequestStatus::Processing,
            RequestState::Completed { .. } => RequestStatus::Completed,
        }
    }
}

/// Result of reporting a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Solution stored, request now completed
    Recorded,
    /// Request was already completed; stored solution left untouched
    AlreadyCompleted,
}
