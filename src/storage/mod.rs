//! Resource cache tiers and fetch-through orchestration.

mod client;
mod disk;
mod memory;
mod tiered;

pub use client::*;
pub use disk::*;
pub use memory::*;
pub use tiered::*;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::DecodeError;

/// A value that can live in a [`ResourceCache`].
pub trait CacheResource: Clone + Send + Sync + 'static {
    /// Estimated in-memory footprint, used to weigh entries for eviction.
    fn cost(&self) -> u32;

    /// Serialized form persisted by the disk tier.
    fn to_bytes(&self) -> Bytes;

    /// Rebuilds a resource from its persisted form.
    fn from_bytes(data: Bytes) -> Result<Self, DecodeError>;
}

impl CacheResource for Bytes {
    fn cost(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }

    fn to_bytes(&self) -> Bytes {
        self.clone()
    }

    fn from_bytes(data: Bytes) -> Result<Self, DecodeError> {
        Ok(data)
    }
}

/// Trait for keyed resource caches.
///
/// Implementations must tolerate arbitrary concurrent callers. An entry
/// evicted from memory behaves exactly like one that was never stored.
#[async_trait]
pub trait ResourceCache<R: CacheResource>: Send + Sync {
    /// Returns the cached resource for `key`, if any tier holds it.
    async fn lookup(&self, key: &str) -> Option<R>;

    /// Caches `resource` under `key`.
    ///
    /// The entry is visible to `lookup` once this returns. Persistence
    /// failures are not reported.
    async fn store(&self, resource: R, key: &str);
}
