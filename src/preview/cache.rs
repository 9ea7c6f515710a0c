//! TTL cache of signed preview URLs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::file::FileRecord;
use crate::Result;

use super::signer::UrlSigner;

/// How long a signed URL is reused before the storage backend is asked again.
pub const DEFAULT_PREVIEW_TTL: Duration = Duration::from_secs(30 * 60);

/// Time source for the cache.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    timestamp: Instant,
}

/// Memoizes file id → signed URL for `ttl`.
///
/// Expired entries are only replaced on read; nothing sweeps the map.
/// Two callers missing the same key concurrently may both sign, the last
/// write wins.
pub struct PreviewUrlCache {
    signer: Arc<dyn UrlSigner>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<i64, CacheEntry>>,
}

impl PreviewUrlCache {
    /// Create a cache using the system clock.
    pub fn new(signer: Arc<dyn UrlSigner>, ttl: Duration) -> Self {
        Self::with_clock(signer, ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit time source.
    pub fn with_clock(signer: Arc<dyn UrlSigner>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            signer,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a usable URL for the file.
    ///
    /// `Ok(None)` when the record has no storage path. Signing failures are
    /// returned as errors and nothing is cached.
    pub async fn get_preview_url(&self, file: &FileRecord) -> Result<Option<String>> {
        let path = match file.storage_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => path,
            _ => {
                tracing::warn!(file_id = file.id, "File has no storage path, no preview URL");
                return Ok(None);
            }
        };

        if let Some(url) = self.lookup(file.id) {
            tracing::trace!(file_id = file.id, "Preview URL cache hit");
            return Ok(Some(url));
        }

        tracing::debug!(file_id = file.id, "Preview URL cache miss, signing");
        let url = self.signer.sign(path).await?;

        let entry = CacheEntry {
            url: url.clone(),
            timestamp: self.clock.now(),
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(file.id, entry);

        Ok(Some(url))
    }

    /// Evict every entry regardless of age. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let count = entries.len();
        entries.clear();
        tracing::info!(count, "Preview URL cache cleared");
        count
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, file_id: i64) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&file_id)?;
        let age = self.clock.now().saturating_duration_since(entry.timestamp);
        (age < self.ttl).then(|| entry.url.clone())
    }
}
