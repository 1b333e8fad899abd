// # ddns-bridged - DDNS Update Bridge Daemon
//
// Thin HTTP layer over `ddns-bridge-core`. Routers call it with the usual
// dyndns parameters; it updates the matching records through the netcup
// CCP API and answers with `good`/`nochg`/`nohost`/`badauth`/`911` lines.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the netcup client, the audit log and the session orchestrator
// 4. Serving HTTP until SIGINT/SIGTERM
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Router account
// - `DDNS_USERNAME`: User name routers must present
// - `DDNS_PASSWORD`: Password routers must present
//
// ### netcup API
// - `DDNS_CUSTOMER_ID`: netcup customer number
// - `DDNS_API_KEY`: API key
// - `DDNS_API_PASSWORD`: API password
// - `DDNS_API_ENDPOINT`: JSON endpoint (optional, defaults to the CCP endpoint)
// - `DDNS_MODE`: `dry-run` to skip record updates
//
// ### Audit log
// - `DDNS_AUDIT_ENABLED`: `true`/`false` (default `true`)
// - `DDNS_AUDIT_LOG_PATH`: JSON file holding the last 100 entries per domain
//
// ### Server
// - `DDNS_LISTEN_ADDR`: Listen address (default `0.0.0.0:8080`)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
//
// ## Example
//
// ```bash
// export DDNS_USERNAME=router
// export DDNS_PASSWORD=secret
// export DDNS_CUSTOMER_ID=12345
// export DDNS_API_KEY=your_api_key
// export DDNS_API_PASSWORD=your_api_password
// export DDNS_AUDIT_LOG_PATH=/var/lib/ddns-bridge/log.json
//
// ddns-bridged
// # curl 'http://localhost:8080/?user=router&password=secret&domain=home.example.com&ipv4=203.0.113.7'
// ```

mod params;
mod server;

use anyhow::{Context, Result};
use ddns_bridge_core::traits::AuditLog;
use ddns_bridge_core::{
    AccountCredentials, ApiCredentials, AuditConfig, BridgeConfig, FileAuditLog, MemoryAuditLog,
    SessionOrchestrator,
};
use ddns_provider_netcup::{DEFAULT_ENDPOINT, NetcupClient};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default listen address
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    username: String,
    password: String,
    customer_id: u64,
    api_key: String,
    api_password: String,
    api_endpoint: String,
    dry_run: bool,
    audit_enabled: bool,
    audit_log_path: Option<String>,
    listen_addr: SocketAddr,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("customer_id", &self.customer_id)
            .field("api_key", &"<REDACTED>")
            .field("api_password", &"<REDACTED>")
            .field("api_endpoint", &self.api_endpoint)
            .field("dry_run", &self.dry_run)
            .field("audit_enabled", &self.audit_enabled)
            .field("audit_log_path", &self.audit_log_path)
            .field("listen_addr", &self.listen_addr)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let customer_id = match lookup("DDNS_CUSTOMER_ID") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .with_context(|| format!("DDNS_CUSTOMER_ID must be a number. Got: {}", raw))?,
            _ => 0,
        };

        let audit_enabled = match lookup("DDNS_AUDIT_ENABLED") {
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => anyhow::bail!("DDNS_AUDIT_ENABLED must be true or false. Got: {}", raw),
            },
            None => true,
        };

        let listen_addr = lookup("DDNS_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().with_context(|| {
            format!("DDNS_LISTEN_ADDR is not a socket address. Got: {}", listen_addr)
        })?;

        Ok(Self {
            username: lookup("DDNS_USERNAME").unwrap_or_default(),
            password: lookup("DDNS_PASSWORD").unwrap_or_default(),
            customer_id,
            api_key: lookup("DDNS_API_KEY").unwrap_or_default(),
            api_password: lookup("DDNS_API_PASSWORD").unwrap_or_default(),
            api_endpoint: lookup("DDNS_API_ENDPOINT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            dry_run: lookup("DDNS_MODE").unwrap_or_default().to_lowercase() == "dry-run",
            audit_enabled,
            audit_log_path: lookup("DDNS_AUDIT_LOG_PATH").filter(|s| !s.trim().is_empty()),
            listen_addr,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Bridge configuration handed to the orchestrator
    fn bridge_config(&self) -> BridgeConfig {
        let audit = match (&self.audit_log_path, self.audit_enabled) {
            (_, false) => AuditConfig::disabled(),
            (Some(path), true) => AuditConfig::file(path.clone()),
            (None, true) => AuditConfig::default(),
        };

        BridgeConfig::new(
            AccountCredentials::new(self.username.clone(), self.password.clone()),
            ApiCredentials::new(self.customer_id, self.api_key.clone(), self.api_password.clone()),
        )
        .with_audit(audit)
    }

    /// Validate the configuration
    ///
    /// Required fields are checked by [`BridgeConfig::validate`]; this adds
    /// the daemon-only settings.
    fn validate(&self) -> Result<()> {
        self.bridge_config()
            .validate()
            .context("Set DDNS_USERNAME, DDNS_PASSWORD, DDNS_CUSTOMER_ID, DDNS_API_KEY, DDNS_API_PASSWORD and DDNS_AUDIT_LOG_PATH")?;

        if !self.api_endpoint.starts_with("https://") && !self.api_endpoint.starts_with("http://") {
            anyhow::bail!(
                "DDNS_API_ENDPOINT must use HTTP or HTTPS scheme. Got: {}",
                self.api_endpoint
            );
        }

        // Check for obvious placeholder keys (common mistake)
        let key_lower = self.api_key.to_lowercase();
        if key_lower.contains("your_api_key") || key_lower.contains("replace_me") {
            anyhow::bail!(
                "DDNS_API_KEY appears to be a placeholder. \
                Use the API key from the netcup customer control panel."
            );
        }

        if let Some(ref path) = self.audit_log_path
            && self.audit_enabled
            && let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            anyhow::bail!(
                "DDNS_AUDIT_LOG_PATH parent directory does not exist: {}. \
                Create it first: sudo mkdir -p {}",
                parent.display(),
                parent.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddns-bridged daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let bridge_config = config.bridge_config();

    let api = NetcupClient::new(config.api_endpoint.clone(), config.dry_run)
        .context("Failed to create netcup client")?;
    if config.dry_run {
        warn!("netcup client running in DRY-RUN mode - no records will be changed");
    }

    let audit: Box<dyn AuditLog> = match bridge_config.audit.path.as_deref() {
        Some(path) if bridge_config.audit.enabled => {
            info!("Audit log: {}", path);
            Box::new(
                FileAuditLog::new(path)
                    .await
                    .context("Failed to open audit log")?,
            )
        }
        _ => {
            info!("Audit log: disabled (kept in memory only)");
            Box::new(MemoryAuditLog::new())
        }
    };

    let orchestrator = SessionOrchestrator::new(Box::new(api), audit, bridge_config)
        .context("Failed to create session orchestrator")?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    server::serve(listener, Arc::new(orchestrator), async {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {:#}", e),
        }
    })
    .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
