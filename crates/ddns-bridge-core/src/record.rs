//! Remote DNS records
//!
//! A [`RemoteRecord`] is one entry of the record set owned by the remote
//! domain-management API. The bridge only ever holds a working copy fetched
//! at session start; provider-specific fields it does not understand ride
//! along in `metadata` so the full set can be submitted back unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// DNS record type
///
/// Unknown types are kept verbatim in [`RecordType::Other`] so that a
/// record set containing them still round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Ptr,
    Caa,
    Other(String),
}

impl RecordType {
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Ptr => "PTR",
            RecordType::Caa => "CAA",
            RecordType::Other(other) => other,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            "CNAME" => RecordType::Cname,
            "MX" => RecordType::Mx,
            "TXT" => RecordType::Txt,
            "NS" => RecordType::Ns,
            "SRV" => RecordType::Srv,
            "PTR" => RecordType::Ptr,
            "CAA" => RecordType::Caa,
            _ => RecordType::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        match value {
            RecordType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for RecordType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RecordType::from(s.to_string()))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the provider's record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// The record's own host label (`@`, `*`, `www`, ...)
    pub sublabel: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Current value (IP, target, text, ...)
    pub destination: String,

    /// Provider-specific fields passed back untouched on submission
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl RemoteRecord {
    /// Create a record without provider metadata
    pub fn new(
        sublabel: impl Into<String>,
        record_type: RecordType,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            sublabel: sublabel.into(),
            record_type,
            destination: destination.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a provider-specific field
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
