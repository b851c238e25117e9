//! HTTP implementation of the catalog and image fetchers.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Endpoint, PageFetcher, PageRequest, ResourceFetcher};
use crate::error::{FetchResult, TransportError};
use crate::models::{ImageConfiguration, ImagePath, ImageSize, Page};

/// Default API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.themoviedb.org";

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every request the client sends.
#[derive(Debug, Clone)]
pub struct ServiceConfiguration {
    /// Scheme and host (optionally port) of the API.
    pub base_url: String,
    /// Query parameters sent ahead of the endpoint's own parameters.
    pub default_parameters: Vec<(String, String)>,
    pub timeout: Duration,
}

impl ServiceConfiguration {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            default_parameters: vec![("api_key".to_string(), api_key.into())],
            ..Default::default()
        }
    }
}

impl Default for ServiceConfiguration {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            default_parameters: Vec::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Catalog API client.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: Url,
    default_parameters: Vec<(String, String)>,
}

impl TmdbClient {
    pub fn new(configuration: ServiceConfiguration) -> Result<Self, TransportError> {
        let base_url = Url::parse(&configuration.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", configuration.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(configuration.base_url));
        }
        let http = reqwest::Client::builder()
            .timeout(configuration.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            default_parameters: configuration.default_parameters,
        })
    }

    /// Builds the URL for `path` with the default parameters first.
    fn build_url(&self, path: &str, parameters: &[(String, String)]) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))?;

        if !self.default_parameters.is_empty() || !parameters.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.default_parameters.iter().chain(parameters));
        }
        Ok(url)
    }

    /// URL of a single page request.
    pub fn page_url(&self, request: &PageRequest) -> Result<Url, TransportError> {
        self.build_url(&request.endpoint().path(), &request.query_pairs())
    }

    /// URL of a non-paged endpoint.
    pub fn endpoint_url(&self, endpoint: &Endpoint) -> Result<Url, TransportError> {
        self.build_url(&endpoint.path(), &endpoint.parameters())
    }

    async fn get(&self, url: Url) -> Result<Bytes, TransportError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }

    /// Fetches the image section of the API configuration.
    pub async fn fetch_configuration(&self) -> FetchResult<ImageConfiguration> {
        debug!("GET {}", Endpoint::Configuration.path());
        let body = self.get(self.endpoint_url(&Endpoint::Configuration)?).await?;
        Ok(ImageConfiguration::decode(&body)?)
    }

    /// Image fetcher sharing this client's connection pool.
    pub fn images(&self, configuration: ImageConfiguration) -> ImageFetcher {
        ImageFetcher {
            http: self.http.clone(),
            configuration,
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + 'static> PageFetcher<T> for TmdbClient {
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<Page<T>> {
        debug!(
            "GET {} page {}",
            request.endpoint().path(),
            request.page_index()
        );
        let body = self.get(self.page_url(request)?).await?;
        Ok(Page::decode(&body)?)
    }
}

/// Downloads images from the image host named by an [`ImageConfiguration`].
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    http: reqwest::Client,
    configuration: ImageConfiguration,
}

impl ImageFetcher {
    pub fn configuration(&self) -> &ImageConfiguration {
        &self.configuration
    }
}

#[async_trait]
impl ResourceFetcher for ImageFetcher {
    async fn fetch_resource(&self, path: &ImagePath, size: ImageSize) -> Result<Bytes, TransportError> {
        let url = self
            .configuration
            .url(size, path)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        debug!("GET image {}", url);
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?)
    }
}
