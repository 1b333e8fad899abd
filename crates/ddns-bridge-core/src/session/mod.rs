//! Session orchestrator
//!
//! Drives one reconciliation attempt for one domain against a [`DnsApi`]:
//!
//! ```text
//! Idle ──login──▶ Authenticated ──fetch──▶ RecordsFetched
//!                                              │
//!                                          reconcile
//!                              ┌───────────────┴───────────────┐
//!                              ▼                               ▼
//!                   ReconciledNoChange            ReconciledSubmitted
//!                              └───────────────┬───────────────┘
//!                                            logout
//!                                              ▼
//!                                          LoggedOut
//! ```
//!
//! ## Failure handling
//!
//! - Credential mismatch: rejected before any remote call
//! - Login rejected: no fetch, no update, no logout (no session exists)
//! - Anything after a successful login: logout is still attempted so the
//!   server-side session is released; the first error is what gets reported
//! - Logout rejected after an otherwise successful run: reported as a
//!   warning on the [`SessionReport`], the update already happened
//!
//! There is no retry anywhere in here. Each login opens a fresh session
//! that serves exactly one fetch/submit/logout cycle.

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::domain::DomainDescriptor;
use crate::error::{Error, Result};
use crate::outcome::{DomainOutcome, Outcome};
use crate::reconcile::{ReconciliationResult, reconcile};
use crate::record::RecordType;
use crate::request::{RawUpdateRequest, UpdateRequest};
use crate::traits::{AuditLog, DnsApi};

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Authenticated,
    RecordsFetched,
    ReconciledNoChange,
    ReconciledSubmitted,
    LoggedOut,
}

/// Result of a session that reached reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    /// Domain as requested
    pub domain: String,
    /// What the reconciler decided
    pub reconciliation: ReconciliationResult,
    /// Whether the record set was submitted
    pub submitted: bool,
    /// Request IP to report when nothing changed (IPv4 first)
    pub fallback_ip: Option<String>,
    /// Logout failure that did not invalidate the run
    pub logout_warning: Option<String>,
}

impl SessionReport {
    /// Terminal state of the session
    pub fn state(&self) -> SessionState {
        match (self.logout_warning.is_some(), self.submitted) {
            (false, _) => SessionState::LoggedOut,
            (true, true) => SessionState::ReconciledSubmitted,
            (true, false) => SessionState::ReconciledNoChange,
        }
    }
}

/// Correlation token for one attempt: hex SHA-256 of domain and time
pub fn request_id(domain: &str) -> String {
    let seed = format!("{}{}", domain, chrono::Utc::now().timestamp_micros());
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// Split a comma-separated domain list, dropping empty entries
pub fn split_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

/// Session orchestrator
///
/// Owns the remote API client, the audit trail and the configuration.
/// Sessions for different domains share nothing but those three.
pub struct SessionOrchestrator {
    api: Box<dyn DnsApi>,
    audit: Box<dyn AuditLog>,
    config: BridgeConfig,
}

impl SessionOrchestrator {
    /// Create a new orchestrator
    ///
    /// Fails if `config` does not validate.
    pub fn new(
        api: Box<dyn DnsApi>,
        audit: Box<dyn AuditLog>,
        config: BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self { api, audit, config })
    }

    /// Handle a batch of domains sharing one set of request fields
    ///
    /// Domains are processed one after another. A failure on one domain is
    /// reported in its outcome and never stops the rest of the batch.
    pub async fn process_batch(
        &self,
        raw: &RawUpdateRequest,
        domains: &[String],
    ) -> Vec<DomainOutcome> {
        let mut outcomes = Vec::with_capacity(domains.len());

        for domain in domains {
            let result = self.process_request(&raw.for_domain(domain.as_str())).await;
            let outcome = Outcome::from_result(&result);

            match &result {
                Ok(_) => info!("{}: {}", domain, outcome),
                Err(e) => error!("{}: {}", domain, e),
            }

            outcomes.push(DomainOutcome {
                domain: domain.clone(),
                outcome,
            });
        }

        if let Err(e) = self.audit.flush().await {
            warn!("Failed to flush audit log: {}", e);
        }

        outcomes
    }

    /// Validate a raw request and reconcile its domain
    pub async fn process_request(&self, raw: &RawUpdateRequest) -> Result<SessionReport> {
        let request = raw.validate()?;
        self.reconcile_domain(&request).await
    }

    /// Run one full session for `request`
    pub async fn reconcile_domain(&self, request: &UpdateRequest) -> Result<SessionReport> {
        let domain = request.domain();

        if let Err(e) = request.verify_credentials(&self.config.account) {
            warn!("Rejected update for {}: credentials do not match", domain);
            return Err(e);
        }

        let descriptor = request.descriptor();
        let request_id = request_id(domain);
        let api = &self.config.api;

        debug!(
            "Starting {} session for {} (apex {}, mode {})",
            self.api.api_name(),
            domain,
            descriptor.apex,
            descriptor.matcher
        );

        // Idle -> Authenticated
        let login = self
            .api
            .login(api.customer_id, &api.api_key, &api.api_password, &request_id)
            .await;
        let login = self.audit_failure(domain, login).await?;

        if !login.is_success() {
            let err = Error::authentication(login.status_code, login.message);
            self.audit(domain, &err.to_string()).await;
            return Err(err);
        }

        let Some(session_id) = login.session_id.filter(|s| !s.is_empty()) else {
            let err = Error::transport("login succeeded without a session id");
            self.audit(domain, &err.to_string()).await;
            return Err(err);
        };
        self.audit(domain, "api login successful").await;
        debug!("{}: {:?}", domain, SessionState::Authenticated);

        let result = self
            .run_authenticated(request, &descriptor, &session_id, &request_id)
            .await;
        let logout = self.logout(domain, &session_id, &request_id).await;

        match (result, logout) {
            (Ok(report), Ok(())) => {
                debug!("{}: {:?}", domain, SessionState::LoggedOut);
                Ok(report)
            }
            (Ok(mut report), Err(e)) => {
                warn!("{}: {} (update result stands)", domain, e);
                report.logout_warning = Some(e.to_string());
                Ok(report)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(logout_err)) => {
                warn!("{}: {}", domain, logout_err);
                Err(e)
            }
        }
    }

    /// Fetch, reconcile and (if needed) submit within an open session
    async fn run_authenticated(
        &self,
        request: &UpdateRequest,
        descriptor: &DomainDescriptor,
        session_id: &str,
        request_id: &str,
    ) -> Result<SessionReport> {
        let domain = request.domain();
        let api = &self.config.api;

        // Authenticated -> RecordsFetched
        let fetched = self
            .api
            .fetch_records(&descriptor.apex, api.customer_id, &api.api_key, session_id, request_id)
            .await;
        let fetched = self.audit_failure(domain, fetched).await?;

        if !fetched.is_success() {
            let err = Error::transport(format!(
                "record fetch failed: {} (status {})",
                fetched.message, fetched.status_code
            ));
            self.audit(domain, &err.to_string()).await;
            return Err(err);
        }

        let records = fetched.records.unwrap_or_default();
        debug!(
            "{}: {:?} ({} record(s) for {})",
            domain,
            SessionState::RecordsFetched,
            records.len(),
            descriptor.apex
        );

        // RecordsFetched -> Reconciled-*
        let reconciliation = reconcile(records, request, descriptor);

        for change in &reconciliation.changes {
            let family = match change.record_type {
                RecordType::A => "IPv4",
                _ => "IPv6",
            };
            self.audit(domain, &format!("{} for {} set to {}", family, change.name, change.new))
                .await;
        }

        let mut submitted = false;
        if !reconciliation.matched {
            self.audit(domain, "no matching DNS record").await;
        } else if reconciliation.changed {
            let updated = self
                .api
                .update_records(
                    &descriptor.apex,
                    api.customer_id,
                    &api.api_key,
                    session_id,
                    request_id,
                    &reconciliation.updated_records,
                )
                .await;
            let updated = self.audit_failure(domain, updated).await?;

            if !updated.is_success() {
                let err = Error::update(updated.status_code, updated.message);
                self.audit(domain, &err.to_string()).await;
                return Err(err);
            }

            submitted = true;
            self.audit(domain, "dns recordset updated").await;
            debug!("{}: {:?}", domain, SessionState::ReconciledSubmitted);
        } else {
            self.audit(domain, "dns recordset NOT updated (no changes)").await;
            debug!("{}: {:?}", domain, SessionState::ReconciledNoChange);
        }

        Ok(SessionReport {
            domain: domain.to_string(),
            reconciliation,
            submitted,
            fallback_ip: request.preferred_ip().map(str::to_string),
            logout_warning: None,
        })
    }

    /// Release the session
    async fn logout(&self, domain: &str, session_id: &str, request_id: &str) -> Result<()> {
        let api = &self.config.api;
        let envelope = self
            .api
            .logout(api.customer_id, &api.api_key, session_id, request_id)
            .await;
        let envelope = self.audit_failure(domain, envelope).await?;

        if !envelope.is_success() {
            let err = Error::logout(envelope.status_code, envelope.message);
            self.audit(domain, &err.to_string()).await;
            return Err(err);
        }

        self.audit(domain, "api logout successful").await;
        Ok(())
    }

    /// Record a failed remote call before handing the error on
    async fn audit_failure<T>(&self, domain: &str, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.audit(domain, &e.to_string()).await;
        }
        result
    }

    /// Append to the audit trail; failures are logged, never propagated
    async fn audit(&self, domain: &str, message: &str) {
        debug!("[{}] {}", domain, message);
        if let Err(e) = self.audit.append(domain, message).await {
            warn!("Failed to write audit entry for {}: {}", domain, e);
        }
    }
}
