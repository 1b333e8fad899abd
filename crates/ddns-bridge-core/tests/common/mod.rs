//! Test doubles and common utilities for session contract tests
//!
//! `MockDnsApi` behaves like a tiny remote API: it owns one record set per
//! apex, answers with scripted status codes and records every call.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_bridge_core::error::{Error, Result};
use ddns_bridge_core::traits::{DnsApi, Envelope, SUCCESS_STATUS_CODE};
use ddns_bridge_core::{
    AccountCredentials, ApiCredentials, AuditConfig, BridgeConfig, MemoryAuditLog,
    RawUpdateRequest, RecordType, RemoteRecord, SessionOrchestrator,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

pub const USER: &str = "router";
pub const PASSWORD: &str = "hunter2";
pub const CUSTOMER_ID: u64 = 12345;
pub const SESSION_ID: &str = "session-abc";

/// A scripted, stateful DnsApi
#[derive(Clone, Default)]
pub struct MockDnsApi {
    zones: Arc<Mutex<HashMap<String, Vec<RemoteRecord>>>>,
    calls: Arc<Mutex<Vec<String>>>,
    submissions: Arc<Mutex<Vec<Vec<RemoteRecord>>>>,
    login_status: Arc<AtomicI64>,
    fetch_status: Arc<AtomicI64>,
    update_status: Arc<AtomicI64>,
    logout_status: Arc<AtomicI64>,
    transport_failures: Arc<Mutex<Vec<String>>>,
}

impl MockDnsApi {
    pub fn new() -> Self {
        let api = Self::default();
        for status in [
            &api.login_status,
            &api.fetch_status,
            &api.update_status,
            &api.logout_status,
        ] {
            status.store(SUCCESS_STATUS_CODE, Ordering::SeqCst);
        }
        api
    }

    /// Seed the remote record set of `apex`
    pub fn with_zone(self, apex: &str, records: Vec<RemoteRecord>) -> Self {
        self.zones.lock().unwrap().insert(apex.to_string(), records);
        self
    }

    pub fn set_login_status(&self, code: i64) {
        self.login_status.store(code, Ordering::SeqCst);
    }

    pub fn set_fetch_status(&self, code: i64) {
        self.fetch_status.store(code, Ordering::SeqCst);
    }

    pub fn set_update_status(&self, code: i64) {
        self.update_status.store(code, Ordering::SeqCst);
    }

    pub fn set_logout_status(&self, code: i64) {
        self.logout_status.store(code, Ordering::SeqCst);
    }

    /// Make every call whose label contains `pattern` fail at transport level
    ///
    /// Labels look like `login`, `fetch:example.com`, `update:example.com`,
    /// `logout`.
    pub fn fail_transport(&self, pattern: &str) {
        self.transport_failures.lock().unwrap().push(pattern.to_string());
    }

    /// Call labels in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose label starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Record sets submitted via update_records
    pub fn submissions(&self) -> Vec<Vec<RemoteRecord>> {
        self.submissions.lock().unwrap().clone()
    }

    /// Current remote record set of `apex`
    pub fn zone(&self, apex: &str) -> Vec<RemoteRecord> {
        self.zones
            .lock()
            .unwrap()
            .get(apex)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, label: String) -> Result<()> {
        self.calls.lock().unwrap().push(label.clone());
        let failing = self
            .transport_failures
            .lock()
            .unwrap()
            .iter()
            .any(|p| label.contains(p.as_str()));
        if failing {
            return Err(Error::transport(format!("connection reset during {}", label)));
        }
        Ok(())
    }

    fn envelope(status: &AtomicI64, what: &str) -> Envelope {
        let code = status.load(Ordering::SeqCst);
        if code == SUCCESS_STATUS_CODE {
            Envelope::success(format!("{} successful", what))
        } else {
            Envelope::failure(code, format!("{} rejected", what))
        }
    }
}

#[async_trait]
impl DnsApi for MockDnsApi {
    async fn login(
        &self,
        customer_id: u64,
        _api_key: &str,
        _api_password: &str,
        _request_id: &str,
    ) -> Result<Envelope> {
        self.enter("login".to_string())?;
        assert_eq!(customer_id, CUSTOMER_ID);

        let envelope = Self::envelope(&self.login_status, "login");
        if envelope.is_success() {
            Ok(envelope.with_session_id(SESSION_ID))
        } else {
            Ok(envelope)
        }
    }

    async fn fetch_records(
        &self,
        apex_domain: &str,
        _customer_id: u64,
        _api_key: &str,
        session_id: &str,
        _request_id: &str,
    ) -> Result<Envelope> {
        self.enter(format!("fetch:{}", apex_domain))?;
        assert_eq!(session_id, SESSION_ID);

        let envelope = Self::envelope(&self.fetch_status, "fetch");
        if !envelope.is_success() {
            return Ok(envelope);
        }

        let records = self.zones.lock().unwrap().get(apex_domain).cloned();
        match records {
            Some(records) => Ok(envelope.with_records(records)),
            None => Ok(envelope),
        }
    }

    async fn update_records(
        &self,
        apex_domain: &str,
        _customer_id: u64,
        _api_key: &str,
        session_id: &str,
        _request_id: &str,
        records: &[RemoteRecord],
    ) -> Result<Envelope> {
        self.enter(format!("update:{}", apex_domain))?;
        assert_eq!(session_id, SESSION_ID);

        let envelope = Self::envelope(&self.update_status, "update");
        if envelope.is_success() {
            self.submissions.lock().unwrap().push(records.to_vec());
            self.zones
                .lock()
                .unwrap()
                .insert(apex_domain.to_string(), records.to_vec());
        }
        Ok(envelope)
    }

    async fn logout(
        &self,
        _customer_id: u64,
        _api_key: &str,
        session_id: &str,
        _request_id: &str,
    ) -> Result<Envelope> {
        self.enter("logout".to_string())?;
        assert_eq!(session_id, SESSION_ID);
        Ok(Self::envelope(&self.logout_status, "logout"))
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// Configuration matching the mock's expectations
pub fn test_config() -> BridgeConfig {
    BridgeConfig::new(
        AccountCredentials::new(USER, PASSWORD),
        ApiCredentials::new(CUSTOMER_ID, "api-key", "api-password"),
    )
    .with_audit(AuditConfig::disabled())
}

/// Orchestrator over clones of `api` and `audit`
pub fn orchestrator(api: &MockDnsApi, audit: &MemoryAuditLog) -> SessionOrchestrator {
    SessionOrchestrator::new(Box::new(api.clone()), Box::new(audit.clone()), test_config())
        .expect("orchestrator construction succeeds")
}

/// A raw request with valid credentials
pub fn raw_request(domain: &str, ipv4: Option<&str>, ipv6: Option<&str>) -> RawUpdateRequest {
    RawUpdateRequest {
        user: Some(USER.to_string()),
        password: Some(PASSWORD.to_string()),
        domain: Some(domain.to_string()),
        mode: None,
        ipv4: ipv4.map(str::to_string),
        ipv6: ipv6.map(str::to_string),
        force: false,
    }
}

pub fn a(sublabel: &str, ip: &str) -> RemoteRecord {
    RemoteRecord::new(sublabel, RecordType::A, ip)
}

pub fn aaaa(sublabel: &str, ip: &str) -> RemoteRecord {
    RemoteRecord::new(sublabel, RecordType::Aaaa, ip)
}
