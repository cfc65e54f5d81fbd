use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::error::BrokerError;

/// Error body returned by every handler: `{"error": msg, ...}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Attach an extra field next to `error`
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.body {
            map.insert(key.to_string(), value.into());
        }
        self
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Validation(msg) => Self::bad_request(msg),
            BrokerError::NotFound(msg) => Self::not_found(msg),
            BrokerError::Unreachable { .. } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            BrokerError::Upstream { status, body } => Self::new(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                body,
            ),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (BrokerError::validation("bad"), StatusCode::BAD_REQUEST),
            (BrokerError::not_found("gone"), StatusCode::NOT_FOUND),
            (
                BrokerError::Unreachable {
                    target: "http://localhost:8000".into(),
                    reason: "refused".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                BrokerError::Upstream {
                    status: 409,
                    body: "conflict".into(),
                },
                StatusCode::CONFLICT,
            ),
            (BrokerError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiError::from(BrokerError::validation("At least one customer required"));
        assert_eq!(err.body, json!({"error": "At least one customer required"}));

        let err = ApiError::not_found("Log file not found").with("searched_file", "x.log");
        assert_eq!(err.body["searched_file"], "x.log");
    }
}
