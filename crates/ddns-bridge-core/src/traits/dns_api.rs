// # DNS API Trait
//
// Session-oriented interface to a remote domain-management API.
//
// ## Implementations
//
// - netcup CCP: `ddns-provider-netcup` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_bridge_core::DnsApi;
//
// let login = api.login(customer_id, api_key, api_password, &request_id).await?;
// if login.is_success() {
//     let session = login.session_id.unwrap_or_default();
//     let records = api.fetch_records("example.com", customer_id, api_key, &session, &request_id).await?;
//     // ...
//     api.logout(customer_id, api_key, &session, &request_id).await?;
// }
// ```

use async_trait::async_trait;

use crate::record::RemoteRecord;

/// Status code the remote API uses for success
pub const SUCCESS_STATUS_CODE: i64 = 2000;

/// Uniform response envelope of every remote call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Provider status code; [`SUCCESS_STATUS_CODE`] means success
    pub status_code: i64,
    /// Human readable provider message
    pub message: String,
    /// Session id, present on a successful login
    pub session_id: Option<String>,
    /// Record set, present on a successful fetch
    pub records: Option<Vec<RemoteRecord>>,
}

impl Envelope {
    /// A bare success envelope
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status_code: SUCCESS_STATUS_CODE,
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failure envelope with the given status code
    pub fn failure(status_code: i64, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            ..Self::default()
        }
    }

    /// Attach a session id
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Attach a record set
    pub fn with_records(mut self, records: Vec<RemoteRecord>) -> Self {
        self.records = Some(records);
        self
    }

    /// Whether the call succeeded at the application level
    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS_STATUS_CODE
    }
}

/// Trait for remote domain-management APIs
///
/// Every method performs exactly one remote call.
///
/// # Error contract
///
/// - `Err(Error::Transport)`: the call did not produce a readable envelope
///   (connection error, timeout, HTTP error status, undecodable body)
/// - `Ok(envelope)` with `!envelope.is_success()`: the provider answered and
///   rejected the call; the orchestrator decides what that means
///
/// Implementations must not retry, cache or spawn tasks; the session
/// orchestrator owns sequencing.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Open a session
    async fn login(
        &self,
        customer_id: u64,
        api_key: &str,
        api_password: &str,
        request_id: &str,
    ) -> Result<Envelope, crate::Error>;

    /// Fetch the full record set of `apex_domain`
    async fn fetch_records(
        &self,
        apex_domain: &str,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
    ) -> Result<Envelope, crate::Error>;

    /// Replace the full record set of `apex_domain`
    async fn update_records(
        &self,
        apex_domain: &str,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
        records: &[RemoteRecord],
    ) -> Result<Envelope, crate::Error>;

    /// Close a session
    async fn logout(
        &self,
        customer_id: u64,
        api_key: &str,
        session_id: &str,
        request_id: &str,
    ) -> Result<Envelope, crate::Error>;

    /// Provider name for logs (e.g. "netcup")
    fn api_name(&self) -> &'static str;
}
