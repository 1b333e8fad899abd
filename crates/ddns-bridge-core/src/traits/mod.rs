//! Core traits for the DDNS update bridge
//!
//! - [`DnsApi`]: Session-oriented remote domain-management API
//! - [`AuditLog`]: Bounded per-domain audit trail

pub mod audit_log;
pub mod dns_api;

pub use audit_log::{AuditLog, MAX_ENTRIES_PER_DOMAIN};
pub use dns_api::{DnsApi, Envelope, SUCCESS_STATUS_CODE};
