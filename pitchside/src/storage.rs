use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::subscriptions::SubscriptionSet;

/// Durable backing record for the subscription set.
///
/// `read` returns `Ok(None)` when no record exists yet. `write` replaces the
/// whole record; there is no merge and no concurrency check.
#[async_trait::async_trait]
pub trait SubscriptionStorage: Send + Sync {
    async fn read(&self) -> Result<Option<SubscriptionSet>>;
    async fn write(&self, set: &SubscriptionSet) -> Result<()>;
}

/// Single JSON document on disk.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "subscriptions.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl SubscriptionStorage for JsonFileStorage {
    async fn read(&self) -> Result<Option<SubscriptionSet>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read subscriptions file: {}", self.path.display())
                })
            }
        };

        let set: SubscriptionSet = serde_json::from_str(&data).with_context(|| {
            format!("Failed to parse subscriptions file: {}", self.path.display())
        })?;
        Ok(Some(set))
    }

    async fn write(&self, set: &SubscriptionSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(set).context("failed to serialize subscriptions")?;

        // Write to a sibling file first so readers never observe a half-written document.
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), "subscriptions persisted");
        Ok(())
    }
}

/// In-process test double with a switch to make writes fail.
#[derive(Default)]
pub struct MemoryStorage {
    record: Mutex<Option<SubscriptionSet>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(set: SubscriptionSet) -> Self {
        Self {
            record: Mutex::new(Some(set)),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `write` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current record without going through the store.
    pub fn snapshot(&self) -> Option<SubscriptionSet> {
        self.record.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SubscriptionStorage for MemoryStorage {
    async fn read(&self) -> Result<Option<SubscriptionSet>> {
        let guard = self
            .record
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(guard.clone())
    }

    async fn write(&self, set: &SubscriptionSet) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("memory storage is refusing writes");
        }
        let mut guard = self
            .record
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *guard = Some(set.clone());
        Ok(())
    }
}
