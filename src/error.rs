//! Error types for pagination, transport, decoding and caching.

use std::path::PathBuf;
use thiserror::Error;

/// Contract violations detected while folding pages into a
/// [`PaginatedList`](crate::models::PaginatedList).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// The first absorbed page was not page 0.
    #[error("initial page index must be 0, got {0}")]
    InitialPageIndexNotZero(usize),

    /// A page was absorbed out of sequence.
    #[error("wrong next page index {got}, expected {expected}")]
    WrongNextPageIndex { got: usize, expected: usize },
}

/// A malformed page envelope or resource payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The JSON document could not be parsed into the expected shape.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The wire `page` field was 0; pages are 1-based on the wire.
    #[error("wire page number must be at least 1")]
    ZeroWirePage,

    /// The bytes are not a recognisable image.
    #[error("invalid image data ({len} bytes): {reason}")]
    InvalidImage { len: usize, reason: String },

    /// The image configuration has no size for the requested tier.
    #[error("no {kind} sizes in the image configuration")]
    MissingImageSizes { kind: &'static str },
}

/// Network-level failure, opaque to the core.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built (bad base URL, bad path).
    #[error("failed to build request URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete (timeout, connectivity).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TransportError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => TransportError::Request(err.to_string()),
        }
    }
}

/// Failure while persisting an entry to the disk tier.
///
/// Never surfaced to cache callers; logged and swallowed at the cache
/// boundary.
#[derive(Debug, Error)]
pub enum CacheWriteError {
    /// The key has no filesystem-safe encoding.
    #[error("key {0:?} cannot be mapped to a cache file name")]
    UnmappableKey(String),

    /// Writing or renaming the cache file failed.
    #[error("failed to write cache file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure of a single page request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Terminal failure of a pagination session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("pagination contract violated: {0}")]
    Pagination(#[from] PaginationError),
}

impl SessionError {
    /// Whether the session failed because the server broke page ordering.
    pub fn is_pagination_related(&self) -> bool {
        matches!(self, SessionError::Pagination(_))
    }
}

/// Result type alias for page fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type alias for session emissions.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_error_messages() {
        assert_eq!(
            PaginationError::InitialPageIndexNotZero(3).to_string(),
            "initial page index must be 0, got 3"
        );
        assert_eq!(
            PaginationError::WrongNextPageIndex { got: 2, expected: 1 }.to_string(),
            "wrong next page index 2, expected 1"
        );
    }

    #[test]
    fn test_session_error_classification() {
        let err = SessionError::from(PaginationError::InitialPageIndexNotZero(1));
        assert!(err.is_pagination_related());

        let err = SessionError::from(FetchError::from(TransportError::Request(
            "timed out".to_string(),
        )));
        assert!(!err.is_pagination_related());
    }
}
