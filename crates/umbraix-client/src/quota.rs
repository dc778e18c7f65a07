//! Daily call allowance for the shared default search key.
//!
//! The counter is keyed by calendar date: the first call on a new date starts
//! again at 1. Read, increment and write happen under one lock so concurrent
//! callers can neither overshoot nor lose counts.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::ClientError;

/// Calls per date allowed on the shared key.
pub const SHARED_KEY_DAILY_LIMIT: u32 = 100;

/// Injected collaborator deciding whether a shared-key call may proceed.
#[async_trait::async_trait]
pub trait QuotaTracker: Send + Sync {
    /// Counts one call on `date` and returns `true`, or returns `false`
    /// without counting when the allowance for `date` is used up.
    async fn check_and_increment(&self, date: NaiveDate) -> Result<bool, ClientError>;

    /// Maximum number of calls per date.
    fn limit(&self) -> u32;
}

/// Counter value for one date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub date: NaiveDate,
    pub count: u32,
}

fn advance(current: Option<QuotaUsage>, date: NaiveDate, limit: u32) -> Option<QuotaUsage> {
    let count = match current {
        Some(usage) if usage.date == date => usage.count,
        _ => 0,
    };
    (count < limit).then_some(QuotaUsage {
        date,
        count: count + 1,
    })
}

/// Process-local tracker.
pub struct InMemoryQuota {
    limit: u32,
    usage: Mutex<Option<QuotaUsage>>,
}

impl InMemoryQuota {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            usage: Mutex::new(None),
        }
    }

    pub async fn usage(&self) -> Option<QuotaUsage> {
        *self.usage.lock().await
    }
}

impl Default for InMemoryQuota {
    fn default() -> Self {
        Self::new(SHARED_KEY_DAILY_LIMIT)
    }
}

#[async_trait::async_trait]
impl QuotaTracker for InMemoryQuota {
    async fn check_and_increment(&self, date: NaiveDate) -> Result<bool, ClientError> {
        let mut usage = self.usage.lock().await;
        match advance(*usage, date, self.limit) {
            Some(next) => {
                *usage = Some(next);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}

/// Tracker persisted as a small JSON file, so the count survives restarts.
pub struct FileQuota {
    path: PathBuf,
    limit: u32,
    lock: Mutex<()>,
}

impl FileQuota {
    pub fn new(path: impl Into<PathBuf>, limit: u32) -> Self {
        Self {
            path: path.into(),
            limit,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored counter, if any.
    pub async fn usage(&self) -> Result<Option<QuotaUsage>, ClientError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    async fn read(&self) -> Result<Option<QuotaUsage>, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                ClientError::Quota(format!(
                    "corrupt quota file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Quota(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, usage: &QuotaUsage) -> Result<(), ClientError> {
        let io_err =
            |e: std::io::Error| ClientError::Quota(format!("failed to write {}: {e}", self.path.display()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let bytes = serde_json::to_vec(usage)
            .map_err(|e| ClientError::Quota(format!("failed to encode quota: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)
    }
}

#[async_trait::async_trait]
impl QuotaTracker for FileQuota {
    async fn check_and_increment(&self, date: NaiveDate) -> Result<bool, ClientError> {
        let _guard = self.lock.lock().await;
        let current = self.read().await?;
        let Some(next) = advance(current, date, self.limit) else {
            warn!(path = %self.path.display(), %date, limit = self.limit, "shared key quota exhausted");
            return Ok(false);
        };
        self.write(&next).await?;
        debug!(%date, count = next.count, limit = self.limit, "shared key quota incremented");
        Ok(true)
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}
