//! Configuration types for the DDNS update bridge
//!
//! A [`BridgeConfig`] is built once at startup and handed to the
//! [`SessionOrchestrator`](crate::SessionOrchestrator) by value. There is no
//! process-wide settings holder.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Credentials routers must present
    pub account: AccountCredentials,

    /// Credentials for the remote domain-management API
    pub api: ApiCredentials,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,
}

impl BridgeConfig {
    /// Create a configuration from its parts
    pub fn new(account: AccountCredentials, api: ApiCredentials) -> Self {
        Self {
            account,
            api,
            audit: AuditConfig::default(),
        }
    }

    /// Set the audit trail settings
    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.account.username.is_empty() {
            return Err(missing_field("username"));
        }
        if self.account.password.is_empty() {
            return Err(missing_field("password"));
        }

        self.api.validate()?;
        self.audit.validate()?;

        Ok(())
    }
}

fn missing_field(field: &str) -> crate::Error {
    crate::Error::config(format!("Missing required configuration field: {}", field))
}

/// Expected dyndns account credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    /// User name routers authenticate with
    pub username: String,
    /// Password routers authenticate with
    pub password: String,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Remote API credentials
///
/// # Security
///
/// Neither the API key nor the API password ever appear in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// Customer number
    pub customer_id: u64,
    /// API key
    pub api_key: String,
    /// API password
    pub api_password: String,
}

impl ApiCredentials {
    pub fn new(customer_id: u64, api_key: impl Into<String>, api_password: impl Into<String>) -> Self {
        Self {
            customer_id,
            api_key: api_key.into(),
            api_password: api_password.into(),
        }
    }

    /// Validate the API credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(missing_field("apiKey"));
        }
        if self.api_password.is_empty() {
            return Err(missing_field("apiPassword"));
        }
        if self.customer_id == 0 {
            return Err(missing_field("customerId"));
        }
        Ok(())
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("customer_id", &self.customer_id)
            .field("api_key", &"<REDACTED>")
            .field("api_password", &"<REDACTED>")
            .finish()
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether entries are persisted to `path`
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,

    /// Path of the JSON audit file (required when enabled)
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Persist the audit trail to `path`
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            enabled: true,
            path: Some(path.into()),
        }
    }

    /// Keep the audit trail in memory only
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: None,
        }
    }

    /// Validate the audit configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.enabled && self.path.as_deref().is_none_or(str::is_empty) {
            return Err(missing_field("logFile"));
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

fn default_audit_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BridgeConfig {
        BridgeConfig::new(
            AccountCredentials::new("router", "hunter2"),
            ApiCredentials::new(12345, "key", "apipass"),
        )
        .with_audit(AuditConfig::file("/tmp/log.json"))
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
        assert!(valid().with_audit(AuditConfig::disabled()).validate().is_ok());
    }

    #[test]
    fn missing_fields_are_named() {
        let mut config = valid();
        config.account.password.clear();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("password"), "{}", err);

        let mut config = valid();
        config.api.customer_id = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("customerId"), "{}", err);

        let config = valid().with_audit(AuditConfig::default());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("logFile"), "{}", err);
    }

    #[test]
    fn secrets_not_exposed_in_debug() {
        let debug = format!("{:?}", valid());
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("apipass"));
        assert!(debug.contains("12345"));
    }

    #[test]
    fn audit_defaults_to_enabled() {
        let config: BridgeConfig = serde_json::from_value(serde_json::json!({
            "account": { "username": "u", "password": "p" },
            "api": { "customer_id": 1, "api_key": "k", "api_password": "s" }
        }))
        .unwrap();
        assert!(config.audit.enabled);
        assert!(config.audit.path.is_none());
    }
}
