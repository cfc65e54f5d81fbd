use thiserror::Error;

/// Main error type for the broker
#[derive(Error, Debug)]
pub enum BrokerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Caller errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Downstream errors
    #[error("Service unreachable: {target} ({reason})")]
    Unreachable { target: String, reason: String },

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BrokerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BrokerError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        BrokerError::NotFound(msg.into())
    }

    /// True for connection refusals and timeouts against another process
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BrokerError::Unreachable { .. })
    }
}

/// Result type alias for BrokerError
pub type Result<T> = std::result::Result<T, BrokerError>;
