//! Coordination Store
//!
//! Single facade over the request ledger, the one-shot fleet config mailbox,
//! the agent status registry and the vehicle telemetry table. Every
//! structure guards itself; no call holds more than one lock, and none
//! waits on another party. Polls answer "nothing available" immediately.
//!
//! Claims carry no lease: a consumer that dies mid-processing leaves its
//! request in `Processing` for the lifetime of the process.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ledger::{RequestCounts, RequestLedger};
use super::mailbox::OneShotMailbox;
use super::registry::AgentRegistry;
use super::telemetry::TelemetryTable;
use crate::clock::{Clock, SystemClock};
use crate::domain::{
    AgentKind, AgentState, AgentStatusRecord, AgentStatusSummary, ClaimedRequest, CvrpPayload,
    FleetConfigDelivery, PositionUpdate, ReportOutcome, RequestId, RequestState,
    VehicleFleetConfig, VehiclePosition,
};
use crate::error::{BrokerError, Result};

pub struct CoordinationStore {
    ledger: RequestLedger,
    fleet_config: OneShotMailbox<FleetConfigDelivery>,
    agents: AgentRegistry,
    positions: TelemetryTable,
    clock: Arc<dyn Clock>,
}

impl Default for CoordinationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: RequestLedger::new(),
            fleet_config: OneShotMailbox::new(),
            agents: AgentRegistry::new(),
            positions: TelemetryTable::new(),
            clock,
        }
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    /// Validate and enqueue a routing request
    pub async fn submit(&self, raw: Value) -> Result<RequestId> {
        let payload = CvrpPayload::parse(raw)?;
        Ok(self.submit_payload(payload).await)
    }

    pub async fn submit_payload(&self, payload: CvrpPayload) -> RequestId {
        let customers = payload.customers().len();
        let id = self.ledger.insert(payload, self.clock.now()).await;
        info!(request_id = %id, customers, "request submitted");
        id
    }

    /// Claim the oldest pending request, if any
    pub async fn claim_next(&self) -> Option<ClaimedRequest> {
        let claimed = self.ledger.claim_oldest_pending().await;
        if claimed.is_none() {
            debug!("no pending request");
        }
        claimed
    }

    pub async fn report_solution(&self, id: RequestId, solution: Value) -> Result<ReportOutcome> {
        let result = self
            .ledger
            .attach_solution(id, solution, self.clock.now())
            .await;
        if let Err(ref e) = result {
            warn!(request_id = %id, "solution rejected: {}", e);
        }
        result
    }

    pub async fn query_status(&self, id: RequestId) -> Option<RequestState> {
        self.ledger.state_of(id).await
    }

    pub async fn request_counts(&self) -> RequestCounts {
        self.ledger.counts().await
    }

    // ------------------------------------------------------------------
    // Fleet config mailbox
    // ------------------------------------------------------------------

    pub async fn set_fleet_config(&self, config: VehicleFleetConfig) {
        let vehicles = config.vehicles.len();
        let delivery = FleetConfigDelivery {
            vehicles: config.vehicles,
            depot: config.depot,
            configured_at: self.clock.now(),
        };
        if self.fleet_config.put(delivery).await.is_some() {
            warn!("unconsumed fleet config replaced");
        }
        info!(vehicles, "fleet config set");
    }

    /// Read-and-clear; at most one caller receives a given config
    pub async fn take_fleet_config(&self) -> Option<FleetConfigDelivery> {
        let taken = self.fleet_config.take().await;
        if let Some(ref delivery) = taken {
            info!(vehicles = delivery.vehicles.len(), "fleet config consumed");
        }
        taken
    }

    // ------------------------------------------------------------------
    // Agent status registry
    // ------------------------------------------------------------------

    pub fn update_agent_status(
        &self,
        name: &str,
        kind: AgentKind,
        status: AgentState,
        info: Map<String, Value>,
    ) -> Result<AgentStatusRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BrokerError::validation("agent_name cannot be empty"));
        }

        let record = AgentStatusRecord {
            name: name.to_string(),
            kind,
            status,
            updated_at: self.clock.now(),
            info,
        };
        self.agents.upsert(record.clone());
        info!(agent = name, kind = %kind, status = %status, "agent status updated");
        Ok(record)
    }

    pub fn list_agent_statuses(&self) -> AgentStatusSummary {
        self.agents.summary()
    }

    // ------------------------------------------------------------------
    // Vehicle telemetry
    // ------------------------------------------------------------------

    pub fn update_position(&self, vehicle: &str, update: PositionUpdate) -> Result<VehiclePosition> {
        let vehicle = vehicle.trim();
        if vehicle.is_empty() {
            return Err(BrokerError::validation("vehicle_name required"));
        }

        let position = VehiclePosition::stamped(update, self.clock.now());
        self.positions.record(vehicle, position.clone());
        debug!(vehicle, x = position.x, y = position.y, status = %position.status, "position updated");
        Ok(position)
    }

    pub fn get_position(&self, vehicle: &str) -> Option<VehiclePosition> {
        self.positions.get(vehicle)
    }

    pub fn all_positions(&self) -> BTreeMap<String, VehiclePosition> {
        self.positions.snapshot()
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::{RequestStatus, VehicleStatus};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::collections::HashSet;

    fn request(customer: &str) -> Value {
        json!({"customers": [{"id": customer, "demand": 3, "x": 1, "y": 1}]})
    }

    fn fleet() -> VehicleFleetConfig {
        VehicleFleetConfig::parse(json!({
            "vehicles": [
                {"name": "V1", "capacity": 10, "maxDistance": 100},
                {"name": "V2", "capacity": 12, "maxDistance": 80}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let store = CoordinationStore::new();
        let id = store.submit(request("C1")).await.unwrap();
        assert_eq!(store.query_status(id).await, Some(RequestState::Pending));

        let claimed = store.claim_next().await.unwrap();
        assert_eq!(claimed.request_id, id);
        assert_eq!(claimed.data.as_value(), &request("C1"));
        assert_eq!(store.query_status(id).await, Some(RequestState::Processing));
        assert!(store.claim_next().await.is_none());

        let solution = json!({"request_id": id.to_string(), "route": [["Depot", "C1", "Depot"]]});
        let outcome = store.report_solution(id, solution.clone()).await.unwrap();
        assert_eq!(outcome, ReportOutcome::Recorded);

        let state = store.query_status(id).await.unwrap();
        assert_eq!(state.status(), RequestStatus::Completed);
        assert_eq!(state, RequestState::Completed { solution });
    }

    #[tokio::test]
    async fn test_invalid_submission_mutates_nothing() {
        let store = CoordinationStore::new();
        let err = store.submit(json!({"customers": "C1"})).await.unwrap_err();

        assert!(matches!(err, BrokerError::Validation(_)));
        assert_eq!(store.request_counts().await, RequestCounts::default());
    }

    #[tokio::test]
    async fn test_duplicate_report_keeps_first_solution() {
        let store = CoordinationStore::new();
        let id = store.submit(request("C1")).await.unwrap();
        store.claim_next().await;

        let first = json!({"route": ["C1"]});
        let second = json!({"route": ["C9"]});
        assert_eq!(
            store.report_solution(id, first.clone()).await.unwrap(),
            ReportOutcome::Recorded
        );
        assert_eq!(
            store.report_solution(id, second).await.unwrap(),
            ReportOutcome::AlreadyCompleted
        );
        assert_eq!(
            store.query_status(id).await,
            Some(RequestState::Completed { solution: first })
        );
    }

    #[tokio::test]
    async fn test_report_for_unknown_request() {
        let store = CoordinationStore::new();
        let err = store
            .report_solution(RequestId::new(), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BrokerError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_double_dispatch() {
        const PENDING: usize = 10;
        const POLLERS: usize = 32;

        let store = Arc::new(CoordinationStore::new());
        let mut submitted = HashSet::new();
        for i in 0..PENDING {
            submitted.insert(store.submit(request(&format!("C{}", i))).await.unwrap());
        }

        let handles: Vec<_> = (0..POLLERS)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.claim_next().await.map(|c| c.request_id) })
            })
            .collect();

        let mut claimed = Vec::new();
        for handle in handles {
            if let Some(id) = handle.await.unwrap() {
                claimed.push(id);
            }
        }

        let distinct: HashSet<_> = claimed.iter().copied().collect();
        assert_eq!(claimed.len(), PENDING.min(POLLERS));
        assert_eq!(distinct.len(), claimed.len());
        assert_eq!(distinct, submitted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_with_fewer_pollers() {
        let store = Arc::new(CoordinationStore::new());
        for i in 0..20 {
            store.submit(request(&format!("C{}", i))).await.unwrap();
        }

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.claim_next().await.map(|c| c.request_id) })
            })
            .collect();

        let mut claimed = HashSet::new();
        for handle in handles {
            assert!(claimed.insert(handle.await.unwrap().unwrap()));
        }
        assert_eq!(claimed.len(), 5);
        assert_eq!(store.request_counts().await.pending, 15);
    }

    #[tokio::test]
    async fn test_fleet_config_is_taken_once() {
        let store = CoordinationStore::new();
        assert!(store.take_fleet_config().await.is_none());

        store.set_fleet_config(fleet()).await;
        let taken = store.take_fleet_config().await.unwrap();
        assert_eq!(taken.vehicles.len(), 2);
        assert!(store.take_fleet_config().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fleet_config_take() {
        let store = Arc::new(CoordinationStore::new());
        store.set_fleet_config(fleet()).await;

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.take_fleet_config().await })
            })
            .collect();

        let mut received = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                received += 1;
            }
        }
        assert_eq!(received, 1);
    }

    #[tokio::test]
    async fn test_mutations_are_stamped_by_clock() {
        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let store = CoordinationStore::with_clock(clock.clone());

        store.set_fleet_config(fleet()).await;
        clock.advance(Duration::seconds(3));
        let position = store
            .update_position(
                "V1",
                PositionUpdate {
                    x: 2.0,
                    y: 3.0,
                    status: VehicleStatus::Moving,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.take_fleet_config().await.unwrap().configured_at, start);
        assert_eq!(position.updated_at, start + Duration::seconds(3));
    }

    #[tokio::test]
    async fn test_agent_statuses() {
        let store = CoordinationStore::new();
        store
            .update_agent_status("DA2", AgentKind::Dispatcher, AgentState::Active, Map::new())
            .unwrap();
        store
            .update_agent_status("MRA", AgentKind::RouteManager, AgentState::Active, Map::new())
            .unwrap();
        store
            .update_agent_status("DA1", AgentKind::Dispatcher, AgentState::Active, Map::new())
            .unwrap();
        store
            .update_agent_status("DA1", AgentKind::Dispatcher, AgentState::Terminated, Map::new())
            .unwrap();

        let summary = store.list_agent_statuses();
        let names: Vec<_> = summary.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["MRA", "DA1", "DA2"]);
        assert_eq!(summary.mra_count, 1);
        assert_eq!(summary.da_count, 1);
        assert_eq!(summary.total_active, 2);

        assert!(store
            .update_agent_status("  ", AgentKind::Dispatcher, AgentState::Active, Map::new())
            .is_err());
    }

    #[tokio::test]
    async fn test_positions() {
        let store = CoordinationStore::new();
        assert!(store.get_position("V1").is_none());
        assert!(store.update_position("", PositionUpdate::default()).is_err());

        store
            .update_position("V2", PositionUpdate::default())
            .unwrap();
        store
            .update_position(
                "V1",
                PositionUpdate {
                    x: 5.0,
                    status: VehicleStatus::AtCustomer,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.get_position("V1").unwrap().status, VehicleStatus::AtCustomer);
        let all: Vec<_> = store.all_positions().into_keys().collect();
        assert_eq!(all, vec!["V1", "V2"]);
    }
}
