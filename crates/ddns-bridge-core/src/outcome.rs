//! Outcome reporting
//!
//! Maps the result of one domain's session onto the small dyndns2-style
//! vocabulary routers understand: `good`, `nochg`, `nohost`, `badauth` and
//! `911` for everything else.

use std::fmt;

use crate::error::{Error, Result};
use crate::session::SessionReport;

/// Caller-facing status of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Records changed and were submitted
    Good {
        /// Effective IP
        ip: String,
    },
    /// Matching records already had the requested addresses
    NoChange {
        /// Effective IP
        ip: String,
    },
    /// No record resolves to the requested domain
    NoHost,
    /// The router presented wrong credentials
    BadAuth,
    /// Anything else went wrong
    Failure {
        /// Underlying message
        message: String,
    },
}

impl Outcome {
    /// Map a session result
    pub fn from_result(result: &Result<SessionReport>) -> Self {
        match result {
            Ok(report) => Self::from_report(report),
            Err(err) => Self::from_error(err),
        }
    }

    /// Map a successful session
    pub fn from_report(report: &SessionReport) -> Self {
        let reconciliation = &report.reconciliation;
        if !reconciliation.matched {
            return Outcome::NoHost;
        }

        let ip = reconciliation
            .effective_ip
            .clone()
            .or_else(|| report.fallback_ip.clone())
            .unwrap_or_default();

        if report.submitted {
            Outcome::Good { ip }
        } else {
            Outcome::NoChange { ip }
        }
    }

    /// Map a failed session
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::CredentialMismatch => Outcome::BadAuth,
            other => Outcome::Failure {
                message: other.to_string(),
            },
        }
    }

    /// Status word of this outcome
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Good { .. } => "good",
            Outcome::NoChange { .. } => "nochg",
            Outcome::NoHost => "nohost",
            Outcome::BadAuth => "badauth",
            Outcome::Failure { .. } => "911",
        }
    }

    /// IP carried by `good` and `nochg`
    pub fn ip(&self) -> Option<&str> {
        match self {
            Outcome::Good { ip } | Outcome::NoChange { ip } => Some(ip),
            _ => None,
        }
    }

    /// Whether the domain's records are in the requested state
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Good { .. } | Outcome::NoChange { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Good { ip } | Outcome::NoChange { ip } => write!(f, "{} {}", self.status(), ip),
            Outcome::Failure { message } => write!(f, "{} {}", self.status(), message),
            _ => f.write_str(self.status()),
        }
    }
}

/// Outcome of one domain in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOutcome {
    /// Domain as requested
    pub domain: String,
    /// Its outcome
    pub outcome: Outcome,
}
