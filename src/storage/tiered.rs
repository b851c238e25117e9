//! Two-tier (memory + disk) resource cache.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::{file_name_for_key, CacheResource, DiskTier, MemoryTier, ResourceCache};

/// Cache consulting a memory tier first and a disk tier second.
///
/// Disk hits are promoted into memory. Stores update memory synchronously
/// and persist to disk in a background task; disk failures are logged and
/// otherwise ignored.
pub struct TieredCache<R: CacheResource> {
    memory: MemoryTier<R>,
    disk: Arc<DiskTier>,
    writes: TaskTracker,
}

impl<R: CacheResource> TieredCache<R> {
    pub fn new(memory: MemoryTier<R>, disk: DiskTier) -> Self {
        Self {
            memory,
            disk: Arc::new(disk),
            writes: TaskTracker::new(),
        }
    }

    /// Opens a cache rooted at `root` with the given memory budget.
    pub async fn open(root: impl Into<PathBuf>, memory_budget: u64) -> std::io::Result<Self> {
        let disk = DiskTier::open(root).await?;
        Ok(Self::new(MemoryTier::new(memory_budget), disk))
    }

    pub fn memory(&self) -> &MemoryTier<R> {
        &self.memory
    }

    pub fn disk(&self) -> &DiskTier {
        &self.disk
    }

    /// Drops the memory tier, leaving the disk tier intact.
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    /// Waits for every disk write spawned so far to finish.
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }
}

#[async_trait]
impl<R: CacheResource> ResourceCache<R> for TieredCache<R> {
    async fn lookup(&self, key: &str) -> Option<R> {
        if let Some(resource) = self.memory.get(key) {
            return Some(resource);
        }

        let data = self.disk.read(key).await?;
        match R::from_bytes(data) {
            Ok(resource) => {
                debug!("Promoting {} from disk to memory", key);
                self.memory.insert(key, resource.clone());
                Some(resource)
            }
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store(&self, resource: R, key: &str) {
        let data = resource.to_bytes();
        self.memory.insert(key, resource);

        if file_name_for_key(key).is_none() {
            debug!("Key {:?} has no file name, caching in memory only", key);
            return;
        }

        let disk = self.disk.clone();
        let key = key.to_string();
        self.writes.spawn(async move {
            if let Err(e) = disk.write(&key, data).await {
                warn!("Cache write for {} failed: {}", key, e);
            }
        });
    }
}
