//! In-memory cache tier.

use async_trait::async_trait;
use std::fs;

use super::{CacheResource, ResourceCache};

/// Physical memory at or below which the device counts as constrained.
pub const CONSTRAINED_MEMORY_THRESHOLD: u64 = 512 * 1024 * 1024;

/// Physical memory assumed when the host does not report it.
pub const FALLBACK_PHYSICAL_MEMORY: u64 = 1024 * 1024 * 1024;

/// Returns the host's physical memory in bytes, if it can be determined.
pub fn physical_memory() -> Option<u64> {
    let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("MemTotal:"))
        .and_then(|rest| rest.trim().trim_end_matches("kB").trim().parse::<u64>().ok())
        .map(|kib| kib * 1024)
}

/// Memory tier budget for a host with `physical` bytes of memory.
///
/// 10% on constrained hosts, 20% otherwise.
pub fn memory_budget(physical: u64) -> u64 {
    if physical <= CONSTRAINED_MEMORY_THRESHOLD {
        physical / 10
    } else {
        physical / 5
    }
}

/// Memory budget derived from the current host.
pub fn default_memory_budget() -> u64 {
    memory_budget(physical_memory().unwrap_or(FALLBACK_PHYSICAL_MEMORY))
}

/// Cost-weighted in-memory tier.
///
/// Eviction is left to `moka`; the only guarantee is that the total cost of
/// resident entries is kept around the configured budget.
pub struct MemoryTier<R: CacheResource> {
    cache: moka::sync::Cache<String, R>,
    budget: u64,
}

impl<R: CacheResource> MemoryTier<R> {
    pub fn new(budget: u64) -> Self {
        let cache = moka::sync::Cache::builder()
            .name("resource-memory-tier")
            .max_capacity(budget)
            .weigher(|_key: &String, value: &R| value.cost())
            .build();
        Self { cache, budget }
    }

    pub fn get(&self, key: &str) -> Option<R> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: &str, resource: R) {
        self.cache.insert(key.to_string(), resource);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    /// Drops every entry, as a burst of memory pressure would.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }
}

impl<R: CacheResource> Default for MemoryTier<R> {
    fn default() -> Self {
        Self::new(default_memory_budget())
    }
}

/// Memory-only cache, used when no disk location is available.
pub struct MemoryCache<R: CacheResource> {
    tier: MemoryTier<R>,
}

impl<R: CacheResource> MemoryCache<R> {
    pub fn new(budget: u64) -> Self {
        Self {
            tier: MemoryTier::new(budget),
        }
    }

    pub fn tier(&self) -> &MemoryTier<R> {
        &self.tier
    }
}

impl<R: CacheResource> Default for MemoryCache<R> {
    fn default() -> Self {
        Self {
            tier: MemoryTier::default(),
        }
    }
}

#[async_trait]
impl<R: CacheResource> ResourceCache<R> for MemoryCache<R> {
    async fn lookup(&self, key: &str) -> Option<R> {
        self.tier.get(key)
    }

    async fn store(&self, resource: R, key: &str) {
        self.tier.insert(key, resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_memory_budget_ratios() {
        assert_eq!(memory_budget(512 * 1024 * 1024), 512 * 1024 * 1024 / 10);
        assert_eq!(memory_budget(256 * 1024 * 1024), 256 * 1024 * 1024 / 10);
        assert_eq!(memory_budget(4 * 1024 * 1024 * 1024), 4 * 1024 * 1024 * 1024 / 5);
        assert!(default_memory_budget() > 0);
    }

    #[test]
    fn test_tier_insert_get_clear() {
        let tier: MemoryTier<Bytes> = MemoryTier::new(1024 * 1024);
        assert!(tier.get("w92/a.jpg").is_none());

        tier.insert("w92/a.jpg", Bytes::from_static(b"poster"));
        assert_eq!(tier.get("w92/a.jpg"), Some(Bytes::from_static(b"poster")));
        assert!(tier.contains("w92/a.jpg"));

        tier.insert("w92/b.jpg", Bytes::from_static(b"still"));

        tier.clear();
        assert!(tier.get("w92/a.jpg").is_none());
        assert!(!tier.contains("w92/a.jpg"));
        assert!(!tier.contains("w92/b.jpg"));

        // entries inserted after a clear survive it
        tier.insert("w92/a.jpg", Bytes::from_static(b"again"));
        assert_eq!(tier.get("w92/a.jpg"), Some(Bytes::from_static(b"again")));
    }

    #[tokio::test]
    async fn test_memory_cache_round_trip() {
        let cache: MemoryCache<Bytes> = MemoryCache::new(1024 * 1024);
        assert!(cache.lookup("k").await.is_none());

        cache.store(Bytes::from_static(b"value"), "k").await;
        assert_eq!(cache.lookup("k").await, Some(Bytes::from_static(b"value")));

        cache.store(Bytes::from_static(b"newer"), "k").await;
        assert_eq!(cache.lookup("k").await, Some(Bytes::from_static(b"newer")));
    }
}
