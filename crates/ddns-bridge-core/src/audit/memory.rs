// # Memory Audit Log
//
// In-memory implementation of AuditLog.
//
// ## When to Use
//
// - Testing environments
// - Deployments with auditing disabled (entries are still bounded per
//   domain, and vanish on restart)

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::audit_log::{AuditLog, format_entry, trim_entries};

/// In-memory audit log
///
/// Clones share the same underlying trail.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    inner: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemoryAuditLog {
    /// Create a new empty audit log
    pub fn new() -> Self {
        Self::default()
    }

    /// Domains with at least one entry
    pub async fn domains(&self) -> Vec<String> {
        self.inner.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, domain: &str, message: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let entries = guard.entry(domain.to_string()).or_default();
        entries.push(format_entry(message));
        trim_entries(entries);
        Ok(())
    }

    async fn entries(&self, domain: &str) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(domain).cloned().unwrap_or_default())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
