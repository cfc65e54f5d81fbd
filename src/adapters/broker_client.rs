//! Broker HTTP client.
//!
//! Speaks the same wire contract the agents use. Every call has a bounded
//! wait; a refused connection or a timeout surfaces as
//! [`BrokerError::Unreachable`], never as a validation or not-found error.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::api::types::{
    AgentUpdateResponse, FleetConfirmResponse, MovementUpdate, MovementUpdateResponse,
    ReportResponse, SolutionStatusResponse, SubmitResponse,
};
use crate::config::ClientConfig;
use crate::domain::{
    AgentKind, AgentState, AgentStatusSummary, FleetConfigDelivery, PositionUpdate, RequestId,
};
use crate::error::{BrokerError, Result};

/// Work item as returned by `GET /api/solve-cvrp?action=poll`
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WorkItem {
    pub request_id: RequestId,
    pub data: Value,
}

#[derive(Clone)]
pub struct BrokerClient {
    http: Client,
    base_url: String,
}

impl BrokerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let http = Client::builder()
            .user_agent(concat!("fleet-broker/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| BrokerError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request; `Ok(None)` for 204 No Content
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);

        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.header(CONTENT_TYPE, "application/json").json(&body);
        }

        let resp = req.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        debug!(%method, path, status = status.as_u16(), "broker responded");

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(match status {
                StatusCode::BAD_REQUEST => BrokerError::Validation(message),
                StatusCode::NOT_FOUND => BrokerError::NotFound(message),
                _ => BrokerError::Upstream {
                    status: status.as_u16(),
                    body: message,
                },
            });
        }

        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<Option<T>> {
        match self.request_json(method, path, query, body).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn call_required<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<T> {
        self.call(method, path, query, body).await?.ok_or_else(|| {
            BrokerError::Upstream {
                status: StatusCode::NO_CONTENT.as_u16(),
                body: format!("unexpected empty response from {}", path),
            }
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> BrokerError {
        if err.is_connect() || err.is_timeout() {
            BrokerError::Unreachable {
                target: self.base_url.clone(),
                reason: if err.is_timeout() {
                    "timed out".to_string()
                } else {
                    "connection refused".to_string()
                },
            }
        } else {
            BrokerError::Http(err)
        }
    }

    // ------------------------------------------------------------------
    // Request ledger
    // ------------------------------------------------------------------

    pub async fn submit_request(&self, payload: Value) -> Result<SubmitResponse> {
        self.call_required(Method::POST, "/api/solve-cvrp", None, Some(payload))
            .await
    }

    pub async fn solution_status(&self, id: &str) -> Result<SolutionStatusResponse> {
        let path = format!("/api/solution/{}", id);
        self.call_required(Method::GET, &path, None, None).await
    }

    /// Claim the next pending request, if any
    pub async fn poll_work(&self) -> Result<Option<WorkItem>> {
        self.call(
            Method::GET,
            "/api/solve-cvrp",
            Some(&[("action", "poll")][..]),
            None,
        )
        .await
    }

    /// Report a solution; the body gains `request_id` when it lacks one
    pub async fn report_solution(&self, id: RequestId, solution: Value) -> Result<ReportResponse> {
        let mut body = match solution {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("solution".to_string(), other);
                map
            }
        };
        body.entry("request_id")
            .or_insert_with(|| Value::String(id.to_string()));

        self.call_required(
            Method::POST,
            "/api/solve-cvrp",
            Some(&[("action", "response")][..]),
            Some(Value::Object(body)),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Fleet config
    // ------------------------------------------------------------------

    pub async fn confirm_vehicles(&self, config: Value) -> Result<FleetConfirmResponse> {
        self.call_required(Method::POST, "/api/vehicles/confirm", None, Some(config))
            .await
    }

    pub async fn poll_fleet_config(&self) -> Result<Option<FleetConfigDelivery>> {
        self.call(Method::GET, "/api/vehicles/poll-config", None, None)
            .await
    }

    // ------------------------------------------------------------------
    // Agents and telemetry
    // ------------------------------------------------------------------

    pub async fn agent_statuses(&self) -> Result<AgentStatusSummary> {
        self.call_required(Method::GET, "/api/agents/status", None, None)
            .await
    }

    pub async fn update_agent_status(
        &self,
        name: &str,
        kind: AgentKind,
        status: AgentState,
        info: Map<String, Value>,
    ) -> Result<AgentUpdateResponse> {
        let body = json!({
            "agent_name": name,
            "agent_type": kind,
            "status": status,
            "info": info,
        });
        self.call_required(Method::POST, "/api/agents/status", None, Some(body))
            .await
    }

    pub async fn update_position(
        &self,
        vehicle: &str,
        position: PositionUpdate,
    ) -> Result<MovementUpdateResponse> {
        let body = serde_json::to_value(MovementUpdate {
            vehicle_name: Some(vehicle.to_string()),
            position,
        })?;
        self.call_required(Method::POST, "/api/movement/update", None, Some(body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalised() {
        let client = BrokerClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client =
            BrokerClient::new(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2))
                .unwrap();
        let err = client.agent_statuses().await.unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {}", err);
    }
}
