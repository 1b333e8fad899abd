//! Error types for the DDNS update bridge
//!
//! Every failure a single domain's reconciliation can hit maps onto one
//! variant of [`Error`]. Request validation problems live in their own
//! [`ValidationError`] so the caller can surface them verbatim.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Problems with the fields of an incoming update request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or absent
    #[error("Missing required payload field: {0}")]
    MissingField(&'static str),

    /// A field was present but malformed
    #[error("Invalid payload field {field}: {reason}")]
    InvalidField {
        /// Field name (`ipv4`, `ipv6`, ...)
        field: &'static str,
        /// Human readable reason
        reason: String,
    },

    /// The `mode` value is not one of the known matching modes
    #[error("Invalid payload field mode: unknown value '{0}' (expected both, * or @)")]
    InvalidMode(String),
}

/// Core error type for the bridge
#[derive(Error, Debug)]
pub enum Error {
    /// The update request failed validation; raised before any remote call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request credentials do not match the configured account
    #[error("Invalid credentials provided")]
    CredentialMismatch,

    /// Remote login returned a non-success status
    #[error("api login failed: {message} (status {status_code})")]
    Authentication {
        /// Provider status code
        status_code: i64,
        /// Provider message
        message: String,
    },

    /// Network, timeout or encoding failure talking to the remote API
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote update call returned a non-success status
    #[error("dns update failed: {message} (status {status_code})")]
    Update {
        /// Provider status code
        status_code: i64,
        /// Provider message
        message: String,
    },

    /// Remote logout call returned a non-success status
    #[error("api logout failed: {message} (status {status_code})")]
    Logout {
        /// Provider status code
        status_code: i64,
        /// Provider message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit log persistence errors
    #[error("Audit log error: {0}")]
    AuditLog(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an audit log error
    pub fn audit_log(msg: impl Into<String>) -> Self {
        Self::AuditLog(msg.into())
    }

    /// Create an authentication failure from a login envelope
    pub fn authentication(status_code: i64, message: impl Into<String>) -> Self {
        Self::Authentication {
            status_code,
            message: message.into(),
        }
    }

    /// Create an update failure from an update envelope
    pub fn update(status_code: i64, message: impl Into<String>) -> Self {
        Self::Update {
            status_code,
            message: message.into(),
        }
    }

    /// Create a logout failure from a logout envelope
    pub fn logout(status_code: i64, message: impl Into<String>) -> Self {
        Self::Logout {
            status_code,
            message: message.into(),
        }
    }
}
