use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle motion state as reported by its dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    #[default]
    Idle,
    Moving,
    AtCustomer,
    AtDepot,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Idle => "idle",
            VehicleStatus::Moving => "moving",
            VehicleStatus::AtCustomer => "at_customer",
            VehicleStatus::AtDepot => "at_depot",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position report body, before the broker stamps it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionUpdate {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub status: VehicleStatus,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub target_x: Option<f64>,
    #[serde(default)]
    pub target_y: Option<f64>,
}

/// Latest known position of one vehicle; no history is kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub x: f64,
    pub y: f64,
    pub status: VehicleStatus,
    pub route_id: Option<String>,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    #[serde(rename = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl VehiclePosition {
    pub fn stamped(update: PositionUpdate, at: DateTime<Utc>) -> Self {
        Self {
            x: update.x,
            y: update.y,
            status: update.status,
            route_id: update.route_id,
            target_x: update.target_x,
            target_y: update.target_y,
            updated_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_defaults() {
        let update: PositionUpdate = serde_json::from_value(json!({"x": 2.0})).unwrap();
        assert_eq!(update.status, VehicleStatus::Idle);
        assert_eq!(update.y, 0.0);
        assert!(update.route_id.is_none());
    }

    #[test]
    fn test_status_wire_names() {
        let update: PositionUpdate =
            serde_json::from_value(json!({"x": 1, "y": 2, "status": "at_customer"})).unwrap();
        assert_eq!(update.status, VehicleStatus::AtCustomer);
        assert_eq!(VehicleStatus::AtDepot.to_string(), "at_depot");
        assert!(serde_json::from_value::<PositionUpdate>(json!({"status": "flying"})).is_err());
    }
}
