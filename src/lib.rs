//! whatfilm-rs: a paginated movie-catalog client with a tiered image cache.
//!
//! The crate has two cores. The pagination engine folds server pages into a
//! [`PaginatedList`] and runs cancellable "load the next page on demand"
//! sessions. The resource cache keeps downloaded images in a cost-weighted
//! memory tier backed by an on-disk tier.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use whatfilm_rs::{Film, NextPageTrigger, PageRequest, PaginationSession, ServiceConfiguration, TmdbClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(TmdbClient::new(ServiceConfiguration::with_api_key("key")).unwrap());
//!     let trigger = NextPageTrigger::new();
//!     let mut films = PaginationSession::<Film, _>::start(client, PageRequest::popular(), trigger.clone());
//!
//!     while let Some(Ok(list)) = films.next().await {
//!         println!("{} films so far", list.len());
//!         if list.page_count() < 3 {
//!             trigger.fire();
//!         } else {
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod images;
pub mod models;
pub mod session;
pub mod storage;
pub mod transport;

// Re-exports for convenience
pub use config::{Args, Command, Config};
pub use error::{
    CacheWriteError, DecodeError, FetchError, FetchResult, PaginationError, SessionError,
    SessionResult, TransportError,
};
pub use feed::{Feed, FeedEvent};
pub use images::ImageService;
pub use models::{Film, Image, ImageConfiguration, ImagePath, ImageSize, Mutation, Page, PaginatedList};
pub use session::{NextPageTrigger, PaginationSession, SessionHandle, SessionStatus};
pub use storage::{
    CacheClient, CacheResource, Cached, DiskTier, MemoryCache, MemoryTier, ResourceCache, TieredCache,
};
pub use transport::{
    Endpoint, ImageFetcher, PageFetcher, PageRequest, ResourceFetcher, ServiceConfiguration, TmdbClient,
};
