//! Fetch-through access to a resource cache.

use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::{CacheResource, ResourceCache};

/// A resource together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<R> {
    pub resource: R,
    /// `true` when served from the cache without calling the fetcher.
    pub was_cached: bool,
}

/// Serves resources from a cache, fetching and storing them on a miss.
///
/// Concurrent misses for the same key each call the fetcher.
pub struct CacheClient<R: CacheResource> {
    cache: Arc<dyn ResourceCache<R>>,
}

impl<R: CacheResource> Clone for CacheClient<R> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<R: CacheResource> CacheClient<R> {
    pub fn new(cache: Arc<dyn ResourceCache<R>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn ResourceCache<R>> {
        &self.cache
    }

    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Cached<R>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        if let Some(resource) = self.cache.lookup(key).await {
            debug!("Cache hit for {}", key);
            return Ok(Cached {
                resource,
                was_cached: true,
            });
        }

        debug!("Cache miss for {}, fetching", key);
        let resource = fetch().await?;
        self.cache.store(resource.clone(), key).await;
        Ok(Cached {
            resource,
            was_cached: false,
        })
    }
}
