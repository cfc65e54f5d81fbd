use dashmap::DashMap;
use std::collections::BTreeMap;

use crate::domain::VehiclePosition;

/// Vehicle name -> latest reported position
#[derive(Debug, Default)]
pub struct TelemetryTable {
    positions: DashMap<String, VehiclePosition>,
}

impl TelemetryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, vehicle: &str, position: VehiclePosition) {
        self.positions.insert(vehicle.to_string(), position);
    }

    pub fn get(&self, vehicle: &str) -> Option<VehiclePosition> {
        self.positions.get(vehicle).map(|p| p.value().clone())
    }

    /// Point-in-time copy, ordered by vehicle name
    pub fn snapshot(&self) -> BTreeMap<String, VehiclePosition> {
        self.positions
            .iter()
            .map(|p| (p.key().clone(), p.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PositionUpdate, VehicleStatus};
    use chrono::Utc;

    #[test]
    fn test_last_write_wins() {
        let table = TelemetryTable::new();
        let first = PositionUpdate {
            x: 1.0,
            y: 1.0,
            ..Default::default()
        };
        let second = PositionUpdate {
            x: 4.0,
            y: 2.0,
            status: VehicleStatus::Moving,
            route_id: Some("R1".to_string()),
            ..Default::default()
        };

        table.record("V1", VehiclePosition::stamped(first, Utc::now()));
        table.record("V1", VehiclePosition::stamped(second, Utc::now()));

        let position = table.get("V1").unwrap();
        assert_eq!(position.x, 4.0);
        assert_eq!(position.status, VehicleStatus::Moving);
        assert_eq!(table.len(), 1);
        assert!(table.get("V2").is_none());
    }
}
