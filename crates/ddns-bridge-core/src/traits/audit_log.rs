// # Audit Log Trait
//
// Per-domain trail of what the bridge did, bounded to the newest
// [`MAX_ENTRIES_PER_DOMAIN`] entries per domain.
//
// The session orchestrator only ever appends; reading is for operators
// and tests. Write failures are never allowed to change a domain's outcome,
// so callers log them and move on.

use async_trait::async_trait;

/// Entries kept per domain
pub const MAX_ENTRIES_PER_DOMAIN: usize = 100;

/// Format one audit entry as `[<RFC 3339 timestamp>] <message>`
pub fn format_entry(message: &str) -> String {
    format!("[{}] {}", chrono::Utc::now().to_rfc3339(), message)
}

/// Drop the oldest entries beyond [`MAX_ENTRIES_PER_DOMAIN`]
pub(crate) fn trim_entries(entries: &mut Vec<String>) {
    if entries.len() > MAX_ENTRIES_PER_DOMAIN {
        let excess = entries.len() - MAX_ENTRIES_PER_DOMAIN;
        entries.drain(..excess);
    }
}

/// Trait for audit log implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append `message` to the trail of `domain`, trimming to the newest
    /// [`MAX_ENTRIES_PER_DOMAIN`] entries
    async fn append(&self, domain: &str, message: &str) -> Result<(), crate::Error>;

    /// Entries of `domain`, oldest first
    async fn entries(&self, domain: &str) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
