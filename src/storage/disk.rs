//! On-disk cache tier.

use bytes::Bytes;
use dashmap::DashMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CacheWriteError;

/// Characters kept verbatim in cache file names; everything else is
/// percent-encoded, so `/` never splits a key into directories.
const FILE_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Longest file name accepted by common filesystems.
const MAX_FILE_NAME_LEN: usize = 255;

/// Maps a cache key to a single filesystem-safe path segment.
///
/// Returns `None` for keys that have no safe encoding: empty keys, keys
/// with control characters, names that would resolve to `.`/`..`, and
/// names longer than [`MAX_FILE_NAME_LEN`].
pub fn file_name_for_key(key: &str) -> Option<String> {
    if key.is_empty() || key.chars().any(char::is_control) {
        return None;
    }
    let name = utf8_percent_encode(key, FILE_NAME_SET).to_string();
    if name == "." || name == ".." || name.len() > MAX_FILE_NAME_LEN {
        return None;
    }
    Some(name)
}

/// Durable tier storing one file per key under a root directory.
///
/// Writes land in a temporary file that is renamed over the target, so a
/// reader sees either the previous or the new contents, never a partial
/// file. Writers of the same key are serialised.
pub struct DiskTier {
    root: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
    reads: AtomicU64,
}

impl DiskTier {
    /// Opens the tier, creating `root` if needed.
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            write_locks: DashMap::new(),
            reads: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `key`'s file, if the key is mappable.
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        file_name_for_key(key).map(|name| self.root.join(name))
    }

    /// Number of file reads attempted for mappable keys.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Reads `key`'s persisted bytes. Any failure is reported as a miss.
    pub async fn read(&self, key: &str) -> Option<Bytes> {
        let path = self.path_for(key)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        match fs::read(&path).await {
            Ok(data) => Some(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Persists `data` under `key`, replacing any previous contents.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), CacheWriteError> {
        let path = self
            .path_for(key)
            .ok_or_else(|| CacheWriteError::UnmappableKey(key.to_string()))?;

        let lock = self.write_locks.entry(key.to_string()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.write_atomically(&path, &data).await
        };
        drop(lock);
        self.write_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);

        if result.is_ok() {
            debug!("Persisted {} bytes to {}", data.len(), path.display());
        }
        result
    }

    async fn write_atomically(&self, path: &Path, data: &[u8]) -> Result<(), CacheWriteError> {
        let tmp = self.root.join(format!(".tmp-{}", Uuid::new_v4().simple()));

        let written = match fs::write(&tmp, data).await {
            Ok(()) => fs::rename(&tmp, path).await,
            Err(e) => Err(e),
        };

        if let Err(source) = written {
            fs::remove_file(&tmp).await.ok();
            return Err(CacheWriteError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        Ok(())
    }
}
