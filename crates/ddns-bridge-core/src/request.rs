//! Update requests
//!
//! [`RawUpdateRequest`] is the canonical parameter set handed over by the
//! HTTP front-end after alias normalization. [`UpdateRequest`] is the
//! validated, immutable value the reconciler and the session orchestrator
//! work with. One `UpdateRequest` is built per domain per invocation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::config::AccountCredentials;
use crate::domain::{DomainDescriptor, MatchMode};
use crate::error::{Error, Result, ValidationError};

/// Unvalidated request fields, already mapped onto canonical names
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUpdateRequest {
    /// Account user name presented by the client
    #[serde(default)]
    pub user: Option<String>,
    /// Account password presented by the client
    #[serde(default)]
    pub password: Option<String>,
    /// Fully-qualified domain (or a comma-separated batch of them)
    #[serde(default)]
    pub domain: Option<String>,
    /// Matching mode (`both`, `*` or `@`)
    #[serde(default)]
    pub mode: Option<String>,
    /// Desired IPv4 address
    #[serde(default)]
    pub ipv4: Option<String>,
    /// Desired IPv6 address
    #[serde(default)]
    pub ipv6: Option<String>,
    /// Rewrite records even when they already match
    #[serde(default)]
    pub force: bool,
}

impl fmt::Debug for RawUpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawUpdateRequest")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("mode", &self.mode)
            .field("ipv4", &self.ipv4)
            .field("ipv6", &self.ipv6)
            .field("force", &self.force)
            .finish()
    }
}

impl RawUpdateRequest {
    /// Copy of this request targeting a single domain of a batch
    pub fn for_domain(&self, domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..self.clone()
        }
    }

    /// Validate into an [`UpdateRequest`]
    pub fn validate(&self) -> Result<UpdateRequest> {
        UpdateRequest::from_raw(self)
    }
}

/// A validated desired-state request for one domain
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    user: String,
    password: String,
    domain: String,
    mode: MatchMode,
    ipv4: Option<String>,
    ipv6: Option<String>,
    force: bool,
}

impl fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("user", &self.user)
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("mode", &self.mode)
            .field("ipv4", &self.ipv4)
            .field("ipv6", &self.ipv6)
            .field("force", &self.force)
            .finish()
    }
}

impl UpdateRequest {
    /// Build and validate a request from raw fields
    ///
    /// Field checks run in a fixed order: user, password, domain, presence
    /// of at least one IP, IPv4 syntax, IPv6 syntax, then mode.
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
        mode: Option<&str>,
        ipv4: Option<String>,
        ipv6: Option<String>,
        force: bool,
    ) -> Result<Self> {
        let user = user.into();
        let password = password.into();
        let domain = domain.into();
        let ipv4 = ipv4.filter(|ip| !ip.is_empty());
        let ipv6 = ipv6.filter(|ip| !ip.is_empty());

        if user.is_empty() {
            return Err(ValidationError::MissingField("user").into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        if domain.is_empty() {
            return Err(ValidationError::MissingField("domain").into());
        }
        if ipv4.is_none() && ipv6.is_none() {
            return Err(ValidationError::MissingField("ipv4 or ipv6").into());
        }
        if let Some(ref ip) = ipv4
            && ip.parse::<Ipv4Addr>().is_err()
        {
            return Err(ValidationError::InvalidField {
                field: "ipv4",
                reason: "Invalid IPv4 address".to_string(),
            }
            .into());
        }
        if let Some(ref ip) = ipv6
            && ip.parse::<Ipv6Addr>().is_err()
        {
            return Err(ValidationError::InvalidField {
                field: "ipv6",
                reason: "Invalid IPv6 address".to_string(),
            }
            .into());
        }

        let mode = match mode.filter(|m| !m.is_empty()) {
            Some(m) => m.parse::<MatchMode>()?,
            None => MatchMode::default(),
        };

        Ok(Self {
            user,
            password,
            domain,
            mode,
            ipv4,
            ipv6,
            force,
        })
    }

    /// Build and validate a request from a [`RawUpdateRequest`]
    pub fn from_raw(raw: &RawUpdateRequest) -> Result<Self> {
        Self::new(
            raw.user.clone().unwrap_or_default(),
            raw.password.clone().unwrap_or_default(),
            raw.domain.clone().unwrap_or_default(),
            raw.mode.as_deref(),
            raw.ipv4.clone(),
            raw.ipv6.clone(),
            raw.force,
        )
    }

    /// Check the presented credentials against the configured account
    pub fn verify_credentials(&self, expected: &AccountCredentials) -> Result<()> {
        if self.user == expected.username && self.password == expected.password {
            Ok(())
        } else {
            Err(Error::CredentialMismatch)
        }
    }

    /// Apex and matcher for this request
    pub fn descriptor(&self) -> DomainDescriptor {
        DomainDescriptor::describe(&self.domain, self.mode)
    }

    /// IP to report when nothing changed: IPv4 first, then IPv6
    pub fn preferred_ip(&self) -> Option<&str> {
        self.ipv4.as_deref().or(self.ipv6.as_deref())
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn ipv4(&self) -> Option<&str> {
        self.ipv4.as_deref()
    }

    pub fn ipv6(&self) -> Option<&str> {
        self.ipv6.as_deref()
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawUpdateRequest {
        RawUpdateRequest {
            user: Some("router".to_string()),
            password: Some("hunter2".to_string()),
            domain: Some("home.example.com".to_string()),
            mode: None,
            ipv4: Some("203.0.113.7".to_string()),
            ipv6: None,
            force: false,
        }
    }

    fn missing_field(result: Result<UpdateRequest>) -> &'static str {
        match result {
            Err(Error::Validation(ValidationError::MissingField(field))) => field,
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn valid_request_defaults_to_root_mode() {
        let request = raw().validate().unwrap();
        assert_eq!(request.mode(), MatchMode::Root);
        assert_eq!(request.domain(), "home.example.com");
        assert_eq!(request.ipv4(), Some("203.0.113.7"));
        assert!(!request.force());
        assert_eq!(request.descriptor().apex, "example.com");
    }

    #[test]
    fn required_fields_are_checked_in_order() {
        let mut r = raw();
        r.user = None;
        r.password = Some(String::new());
        assert_eq!(missing_field(r.validate()), "user");

        let mut r = raw();
        r.password = Some(String::new());
        assert_eq!(missing_field(r.validate()), "password");

        let mut r = raw();
        r.domain = None;
        assert_eq!(missing_field(r.validate()), "domain");

        let mut r = raw();
        r.ipv4 = Some(String::new());
        assert_eq!(missing_field(r.validate()), "ipv4 or ipv6");
    }

    #[test]
    fn ip_syntax_is_validated_per_family() {
        let mut r = raw();
        r.ipv4 = Some("256.1.1.1".to_string());
        assert!(matches!(
            r.validate(),
            Err(Error::Validation(ValidationError::InvalidField { field: "ipv4", .. }))
        ));

        let mut r = raw();
        r.ipv4 = Some("2001:db8::1".to_string());
        assert!(matches!(
            r.validate(),
            Err(Error::Validation(ValidationError::InvalidField { field: "ipv4", .. }))
        ));

        let mut r = raw();
        r.ipv4 = None;
        r.ipv6 = Some("2001:db8::zz".to_string());
        assert!(matches!(
            r.validate(),
            Err(Error::Validation(ValidationError::InvalidField { field: "ipv6", .. }))
        ));

        let mut r = raw();
        r.ipv4 = None;
        r.ipv6 = Some("2001:db8::1".to_string());
        assert_eq!(r.validate().unwrap().preferred_ip(), Some("2001:db8::1"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut r = raw();
        r.mode = Some("all".to_string());
        assert!(matches!(
            r.validate(),
            Err(Error::Validation(ValidationError::InvalidMode(_)))
        ));

        r.mode = Some("both".to_string());
        assert_eq!(r.validate().unwrap().mode(), MatchMode::Both);
    }

    #[test]
    fn credential_check() {
        let request = raw().validate().unwrap();
        let good = AccountCredentials::new("router", "hunter2");
        let bad = AccountCredentials::new("router", "wrong");

        assert!(request.verify_credentials(&good).is_ok());
        assert!(matches!(
            request.verify_credentials(&bad),
            Err(Error::CredentialMismatch)
        ));
    }

    #[test]
    fn password_not_exposed_in_debug() {
        let request = raw().validate().unwrap();
        let debug = format!("{:?} {:?}", request, raw());
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn for_domain_keeps_other_fields() {
        let batch = raw().for_domain("other.example.com");
        assert_eq!(batch.domain.as_deref(), Some("other.example.com"));
        assert_eq!(batch.ipv4, raw().ipv4);
    }
}
