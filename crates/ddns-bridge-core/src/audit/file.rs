// # File Audit Log
//
// File-based implementation of AuditLog with crash recovery.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename
// - Automatic backup: keeps `.backup` of the last written trail
// - Recovery: falls back to the backup if the main file does not parse
//
// ## File Format
//
// ```json
// {
//   "home.example.com": [
//     "[2025-01-09T12:00:00+00:00] api login successful",
//     "[2025-01-09T12:00:01+00:00] IPv4 for home.example.com set to 203.0.113.7"
//   ]
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::Error;
use crate::traits::audit_log::{AuditLog, format_entry, trim_entries};

type Trail = BTreeMap<String, Vec<String>>;

/// File-based audit log with crash recovery
///
/// Every append is written through to disk immediately.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_bridge_core::audit::FileAuditLog;
/// use ddns_bridge_core::traits::AuditLog;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = FileAuditLog::new("/var/lib/ddns-bridge/log.json").await?;
///     log.append("home.example.com", "api login successful").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    trail: Arc<RwLock<Trail>>,
    /// Serializes snapshot, temp write and rename
    write_guard: Mutex<()>,
}

impl FileAuditLog {
    /// Create or load a file audit log
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing trail
    /// 3. If it is corrupt, load the backup instead
    /// 4. If both fail, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create audit log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let trail = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            trail: Arc::new(RwLock::new(trail)),
            write_guard: Mutex::new(()),
        })
    }

    async fn load_with_recovery(path: &Path) -> Result<Trail, Error> {
        match Self::load(path).await {
            Ok(trail) => {
                tracing::debug!("Loaded audit log: {} domain(s)", trail.len());
                Ok(trail)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Audit log appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No audit log backup found. Starting with an empty trail.");
                    return Ok(Trail::new());
                }

                match Self::load(&backup_path).await {
                    Ok(trail) => {
                        tracing::info!("Recovered audit log from backup: {} domain(s)", trail.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore audit log from backup: {}",
                                restore_err
                            );
                        }
                        Ok(trail)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Audit log backup also unreadable: {}. Starting with an empty trail.",
                            backup_err
                        );
                        Ok(Trail::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<Trail, Error> {
        if !path.exists() {
            tracing::debug!("Audit log does not exist yet: {}", path.display());
            return Ok(Trail::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::audit_log(format!(
                "Failed to read audit log {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Write the whole trail to disk atomically
    async fn write(&self) -> Result<(), Error> {
        let _writing = self.write_guard.lock().await;

        let json = {
            let guard = self.trail.read().await;
            serde_json::to_string_pretty(&*guard)?
        };

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::audit_log(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::audit_log(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::audit_log(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create audit log backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::audit_log(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Audit log written: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn append(&self, domain: &str, message: &str) -> Result<(), Error> {
        {
            let mut guard = self.trail.write().await;
            let entries = guard.entry(domain.to_string()).or_default();
            entries.push(format_entry(message));
            trim_entries(entries);
        }

        self.write().await
    }

    async fn entries(&self, domain: &str) -> Result<Vec<String>, Error> {
        let guard = self.trail.read().await;
        Ok(guard.get(domain).cloned().unwrap_or_default())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Appends are written through
        Ok(())
    }
}
