// # netcup CCP DNS API
//
// `DnsApi` implementation for the netcup customer control panel JSON
// endpoint.
//
// ## Behavior
//
// - One HTTP POST per trait call, nothing else
// - HTTP timeout of 30 seconds
// - Connection failures, non-2xx HTTP statuses and undecodable bodies are
//   `Error::Transport`; a decoded body is always returned as an `Envelope`,
//   whatever its `statuscode`
// - No retries, no caching, no background tasks: a session is owned by the
//   orchestrator from login to logout
// - Dry-run mode performs every call except `updateDnsRecords`
//
// ## Security
//
// API key, API password and session id never appear in logs or in the
// `Debug` output of the client.
//
// ## API Reference
//
// - Endpoint: `https://ccp.netcup.net/run/webservice/servers/endpoint.php?JSON`
// - Actions: `login`, `infoDnsRecords`, `updateDnsRecords`, `logout`

mod wire;

use async_trait::async_trait;
use ddns_bridge_core::traits::{DnsApi, Envelope};
use ddns_bridge_core::{Error, RemoteRecord, Result};
use serde_json::{Value, json};
use std::time::Duration;

use crate::wire::{ApiRequest, ApiResponse, record_to_wire};

/// Default CCP JSON endpoint
pub const DEFAULT_ENDPOINT: &str =
    "https://ccp.netcup.net/run/webservice/servers/endpoint.php?JSON";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// netcup CCP API client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true the client logs in, fetches and logs out as
/// usual but never sends `updateDnsRecords`. The update call is answered
/// with a synthetic success envelope instead.
pub struct NetcupClient {
    /// JSON endpoint URL
    endpoint: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, skip `updateDnsRecords`
    dry_run: bool,
}

impl std::fmt::Debug for NetcupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetcupClient")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl NetcupClient {
    /// Create a new client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: JSON endpoint URL, usually [`DEFAULT_ENDPOINT`]
    /// - `dry_run`: If true, skip `updateDnsRecords`
    pub fn new(endpoint: impl Into<String>, dry_run: bool) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(Error::config("netcup API endpoint cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            client,
            dry_run,
        })
    }

    /// Create a live client against [`DEFAULT_ENDPOINT`]
    pub fn new_live() -> Result<Self> {
        Self::new(DEFAULT_ENDPOINT, false)
    }

    /// Create a dry-run client against [`DEFAULT_ENDPOINT`]
    pub fn new_dry_run() -> Result<Self> {
        Self::new(DEFAULT_ENDPOINT, true)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// POST one action and decode the answer
    async fn call(&self, action: &str, param: Value) -> Result<Envelope> {
        tracing::debug!("netcup request: {}", action);

        let body = ApiRequest { action, param };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: HTTP request failed: {}", action, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(Error::transport(format!(
                "{}: HTTP {} - {}",
                action, status, error_text
            )));
        }

        let decoded: ApiResponse = response.json().await.map_err(|e| {
            Error::transport(format!("{}: Failed to parse response: {}", action, e))
        })?;
        let envelope = decoded.into_envelope()?;

        tracing::debug!(
            "netcup response: {} -> status {} ({})",
            action,
            envelope.status_code,
            envelope.message
        );
        Ok(envelope)
    }
}

#[async_trait]
impl DnsApi for NetcupClient {
    async fn login(
        &self,
        customer_id: u64,
        api_key: &str,
        api_password: &str,
        request_id: &str,
    ) -> Result<Envelope> {
        self.call(
            "login",
            json!({
                "customernumber": customer_id,
                "apikey": api_key,
                "apipassword": api_password,
                "clientrequestid": request_id,
            }),
        )
        .await
    }

    async fn fetch_records(
        &self,
        apex_domain: &str,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
    ) -> Result<Envelope> {
        self.call(
            "infoDnsRecords",
            json!({
                "domainname": apex_domain,
                "customernumber": customer_id,
                "apikey": api_key,
                "apisessionid": session_id,
                "clientrequestid": request_id,
            }),
        )
        .await
    }

    async fn update_records(
        &self,
        apex_domain: &str,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
        records: &[RemoteRecord],
    ) -> Result<Envelope> {
        let dnsrecords: Vec<Value> = records.iter().map(record_to_wire).collect();

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send updateDnsRecords for {} with {} record(s): {}",
                apex_domain,
                dnsrecords.len(),
                serde_json::Value::Array(dnsrecords)
            );
            return Ok(Envelope::success("DRY-RUN: DNS records not updated"));
        }

        self.call(
            "updateDnsRecords",
            json!({
                "domainname": apex_domain,
                "customernumber": customer_id,
                "apikey": api_key,
                "apisessionid": session_id,
                "clientrequestid": request_id,
                "dnsrecordset": { "dnsrecords": dnsrecords },
            }),
        )
        .await
    }

    async fn logout(
        &self,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
    ) -> Result<Envelope> {
        self.call(
            "logout",
            json!({
                "customernumber": customer_id,
                "apikey": api_key,
                "apisessionid": session_id,
                "clientrequestid": request_id,
            }),
        )
        .await
    }

    fn api_name(&self) -> &'static str {
        "netcup"
    }
}
