use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

use crate::error::{BrokerError, Result};

/// One vehicle the agent runtime should spawn a dispatcher for.
///
/// Numeric fields keep the representation the frontend sent so the
/// agent launcher sees `10` rather than `10.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub name: String,
    pub capacity: Number,
    #[serde(rename = "maxDistance")]
    pub max_distance: Number,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleSpec {
    pub fn capacity(&self) -> f64 {
        self.capacity.as_f64().unwrap_or(0.0)
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance.as_f64().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Default for Depot {
    fn default() -> Self {
        Self {
            name: "Depot".to_string(),
            x: 0.0,
            y: 0.0,
        }
    }
}

/// Vehicle fleet handed once to the agent launcher
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleFleetConfig {
    pub vehicles: Vec<VehicleSpec>,
    pub depot: Depot,
}

impl VehicleFleetConfig {
    pub fn parse(raw: Value) -> Result<Self> {
        let list = raw
            .get("vehicles")
            .ok_or_else(|| BrokerError::validation("Invalid request - vehicles required"))?
            .as_array()
            .filter(|list| !list.is_empty())
            .ok_or_else(|| BrokerError::validation("At least one vehicle required"))?;

        let mut vehicles = Vec::with_capacity(list.len());
        let mut seen = HashSet::new();
        for entry in list {
            let has_fields = entry.get("name").is_some()
                && entry.get("capacity").is_some()
                && entry.get("maxDistance").is_some();
            if !has_fields {
                return Err(BrokerError::validation(
                    "Each vehicle must have: name, capacity, maxDistance",
                ));
            }

            let vehicle: VehicleSpec = serde_json::from_value(entry.clone()).map_err(|e| {
                BrokerError::validation(format!("Invalid vehicle definition: {}", e))
            })?;

            if vehicle.name.trim().is_empty() {
                return Err(BrokerError::validation("Vehicle name cannot be empty"));
            }
            if vehicle.capacity() <= 0.0 {
                return Err(BrokerError::validation(format!(
                    "Vehicle {} capacity must be positive",
                    vehicle.name
                )));
            }
            if vehicle.max_distance() <= 0.0 {
                return Err(BrokerError::validation(format!(
                    "Vehicle {} maxDistance must be positive",
                    vehicle.name
                )));
            }
            if !seen.insert(vehicle.name.clone()) {
                return Err(BrokerError::validation(format!(
                    "Duplicate vehicle name: {}",
                    vehicle.name
                )));
            }
            vehicles.push(vehicle);
        }

        let depot = match raw.get("depot") {
            None | Some(Value::Null) => Depot::default(),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| BrokerError::validation(format!("Invalid depot: {}", e)))?,
        };

        Ok(Self { vehicles, depot })
    }

    pub fn vehicle_names(&self) -> Vec<String> {
        self.vehicles.iter().map(|v| v.name.clone()).collect()
    }
}

/// Config taken out of the mailbox, with the time it was set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfigDelivery {
    pub vehicles: Vec<VehicleSpec>,
    pub depot: Depot,
    #[serde(rename = "timestamp")]
    pub configured_at: DateTime<Utc>,
}
