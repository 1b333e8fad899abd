// # ddns-bridge-core
//
// Core library of the DDNS update bridge: a router asks for a domain to
// point at an IP, the bridge logs into the domain-management API, fetches
// the record set, decides whether anything must change and, if so, pushes
// the updated set back.
//
// ## Architecture Overview
//
// - **DomainDescriptor**: apex + placeholder matcher for a requested domain
// - **UpdateRequest**: validated desired state for one domain
// - **reconcile**: the record reconciliation engine (pure, no I/O)
// - **SessionOrchestrator**: login -> fetch -> reconcile -> submit -> logout
// - **Outcome**: dyndns2-style status for the caller
// - **DnsApi**: trait for remote domain-management APIs
// - **AuditLog**: trait for the bounded per-domain audit trail
//
// ## Design Principles
//
// 1. **Idempotency**: the same request against unchanged records never
//    resubmits unless `force` is set
// 2. **Isolation**: every domain gets its own session; one failure never
//    stops a batch
// 3. **Explicit configuration**: no global state, config is injected
// 4. **Library-First**: the daemon is a thin HTTP layer over this crate

pub mod audit;
pub mod config;
pub mod domain;
pub mod error;
pub mod outcome;
pub mod reconcile;
pub mod record;
pub mod request;
pub mod session;
pub mod traits;

// Re-export core types for convenience
pub use audit::{FileAuditLog, MemoryAuditLog};
pub use config::{AccountCredentials, ApiCredentials, AuditConfig, BridgeConfig};
pub use domain::{DomainDescriptor, MatchMode};
pub use error::{Error, Result, ValidationError};
pub use outcome::{DomainOutcome, Outcome};
pub use reconcile::{ReconciliationResult, RecordChange, reconcile};
pub use record::{RecordType, RemoteRecord};
pub use request::{RawUpdateRequest, UpdateRequest};
pub use session::{SessionOrchestrator, SessionReport, SessionState, split_domains};
pub use traits::{AuditLog, DnsApi, Envelope};
