// # Domain Descriptor
//
// Splits a fully-qualified domain into the apex the remote API addresses
// ("hostname" in netcup terms) and the set of placeholder sub-labels that
// stand for that apex in the record set.
//
// ## Apex heuristic
//
// - exactly one dot: the domain itself is the apex (`example.com`)
// - otherwise: the leftmost label is dropped (`nas.example.com` -> `example.com`)
//
// Known limitation: multi-label public suffixes are misclassified
// (`nas.example.co.uk` -> `example.co.uk` works by accident, but
// `example.co.uk` -> `co.uk` does not). Correct resolution needs the public
// suffix list and is intentionally not done here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Which placeholder sub-labels are authoritative for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    /// Both the root (`@`) and wildcard (`*`) records
    #[serde(rename = "both")]
    Both,
    /// Only the wildcard (`*`) record
    #[serde(rename = "*")]
    Wildcard,
    /// Only the root (`@`) record
    #[default]
    #[serde(rename = "@")]
    Root,
}

impl MatchMode {
    /// Placeholder labels this mode treats as "the apex itself"
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            MatchMode::Both => &["@", "*"],
            MatchMode::Wildcard => &["*"],
            MatchMode::Root => &["@"],
        }
    }

    /// Whether `sublabel` is one of this mode's placeholders
    pub fn matches(self, sublabel: &str) -> bool {
        self.labels().contains(&sublabel)
    }
}

impl FromStr for MatchMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(MatchMode::Both),
            "*" | "wildcard" => Ok(MatchMode::Wildcard),
            "@" | "root" => Ok(MatchMode::Root),
            _ => Err(ValidationError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchMode::Both => "both",
            MatchMode::Wildcard => "*",
            MatchMode::Root => "@",
        })
    }
}

/// Apex plus matcher derived from a request's domain and mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDescriptor {
    /// API-addressable domain the record set belongs to
    pub apex: String,
    /// Placeholder labels considered to be the apex itself
    pub matcher: MatchMode,
}

impl DomainDescriptor {
    /// Describe `domain` under the given matching mode
    ///
    /// Pure and infallible. Empty labels are not guarded here; callers are
    /// expected to validate the domain first.
    pub fn describe(domain: &str, mode: MatchMode) -> Self {
        Self {
            apex: apex_of(domain),
            matcher: mode,
        }
    }

    /// Fully-qualified name a record with `sublabel` resolves to
    pub fn real_name(&self, sublabel: &str) -> String {
        if self.matcher.matches(sublabel) {
            self.apex.clone()
        } else {
            format!("{}.{}", sublabel, self.apex)
        }
    }
}

/// Apex of a domain using the one-dot heuristic
pub fn apex_of(domain: &str) -> String {
    if domain.matches('.').count() == 1 {
        return domain.to_string();
    }

    match domain.split_once('.') {
        Some((_, rest)) => rest.to_string(),
        None => domain.to_string(),
    }
}
