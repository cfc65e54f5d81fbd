//! Request Ledger
//!
//! Insertion-ordered map of submitted routing requests. Claiming is the
//! mutual-exclusion point: the whole scan-and-mark happens under one lock,
//! so a pending request is handed to exactly one poller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{
    ClaimedRequest, CvrpPayload, ReportOutcome, RequestId, RequestRecord, RequestState,
    RequestStatus, Solution,
};
use crate::error::{BrokerError, Result};

#[derive(Debug, Default)]
struct LedgerInner {
    records: Vec<RequestRecord>,
    index: HashMap<RequestId, usize>,
    /// Every record before this position is no longer pending
    claim_cursor: usize,
}

/// Per-status request counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
}

#[derive(Debug, Default)]
pub struct RequestLedger {
    inner: Mutex<LedgerInner>,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a validated request as pending
    pub async fn insert(&self, payload: CvrpPayload, at: DateTime<Utc>) -> RequestId {
        let mut inner = self.inner.lock().await;

        let mut id = RequestId::new();
        while inner.index.contains_key(&id) {
            id = RequestId::new();
        }

        let position = inner.records.len();
        inner.records.push(RequestRecord {
            id,
            payload,
            status: RequestStatus::Pending,
            submitted_at: at,
            solution: None,
        });
        inner.index.insert(id, position);
        id
    }

    /// Mark the oldest pending request as processing and hand it out
    pub async fn claim_oldest_pending(&self) -> Option<ClaimedRequest> {
        let mut inner = self.inner.lock().await;

        let mut cursor = inner.claim_cursor;
        while cursor < inner.records.len() && inner.records[cursor].status != RequestStatus::Pending
        {
            cursor += 1;
        }
        inner.claim_cursor = cursor;

        let record = inner.records.get_mut(cursor)?;
        record.status = RequestStatus::Processing;
        let claimed = ClaimedRequest {
            request_id: record.id,
            data: record.payload.clone(),
        };
        inner.claim_cursor = cursor + 1;

        info!(request_id = %claimed.request_id, "request claimed");
        Some(claimed)
    }

    /// Attach a solution; the first writer wins
    pub async fn attach_solution(
        &self,
        id: RequestId,
        solution: Value,
        at: DateTime<Utc>,
    ) -> Result<ReportOutcome> {
        let mut inner = self.inner.lock().await;

        let position = *inner
            .index
            .get(&id)
            .ok_or_else(|| BrokerError::not_found(format!("request {}", id)))?;
        let record = &mut inner.records[position];

        match record.status {
            RequestStatus::Completed => {
                debug!(request_id = %id, "duplicate solution ignored");
                Ok(ReportOutcome::AlreadyCompleted)
            }
            status => {
                if status == RequestStatus::Pending {
                    warn!(request_id = %id, "solution reported for a request that was never claimed");
                }
                record.status = RequestStatus::Completed;
                record.solution = Some(Solution {
                    payload: solution,
                    recorded_at: at,
                });
                info!(request_id = %id, "solution recorded");
                Ok(ReportOutcome::Recorded)
            }
        }
    }

    pub async fn state_of(&self, id: RequestId) -> Option<RequestState> {
        let inner = self.inner.lock().await;
        let record = &inner.records[*inner.index.get(&id)?];

        Some(match (&record.status, &record.solution) {
            (RequestStatus::Pending, _) => RequestState::Pending,
            (RequestStatus::Processing, _) => RequestState::Processing,
            (RequestStatus::Completed, Some(solution)) => RequestState::Completed {
                solution: solution.payload.clone(),
            },
            (RequestStatus::Completed, None) => RequestState::Completed {
                solution: Value::Null,
            },
        })
    }

    pub async fn counts(&self) -> RequestCounts {
        let inner = self.inner.lock().await;
        inner
            .records
            .iter()
            .fold(RequestCounts::default(), |mut counts, record| {
                match record.status {
                    RequestStatus::Pending => counts.pending += 1,
                    RequestStatus::Processing => counts.processing += 1,
                    RequestStatus::Completed => counts.completed += 1,
                }
                counts
            })
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
