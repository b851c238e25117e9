//! Cached image retrieval.

use std::sync::Arc;

use crate::error::{FetchError, FetchResult};
use crate::models::{Image, ImageConfiguration, ImagePath, ImageSize};
use crate::storage::{CacheClient, Cached, ResourceCache};
use crate::transport::ResourceFetcher;

/// Resolves image paths to decoded images, going through a cache.
pub struct ImageService {
    configuration: ImageConfiguration,
    fetcher: Arc<dyn ResourceFetcher>,
    client: CacheClient<Image>,
}

impl ImageService {
    pub fn new(
        configuration: ImageConfiguration,
        fetcher: Arc<dyn ResourceFetcher>,
        cache: Arc<dyn ResourceCache<Image>>,
    ) -> Self {
        Self {
            configuration,
            fetcher,
            client: CacheClient::new(cache),
        }
    }

    pub fn configuration(&self) -> &ImageConfiguration {
        &self.configuration
    }

    /// Returns the image for `path` at `size`, downloading it on a miss.
    ///
    /// Downloads that do not decode as an image are not cached.
    pub async fn image(&self, path: &ImagePath, size: ImageSize) -> FetchResult<Cached<Image>> {
        let key = self.configuration.cache_key(size, path)?;
        let fetcher = self.fetcher.clone();
        let path = path.clone();

        self.client
            .get_or_fetch(&key, move || async move {
                let data = fetcher.fetch_resource(&path, size).await?;
                Ok::<_, FetchError>(Image::decode(data)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, TransportError};
    use crate::storage::{CacheResource, MemoryCache};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::io::Cursor;
    use std::sync::Mutex;

    struct Host {
        body: Bytes,
        requests: Mutex<Vec<(ImagePath, ImageSize)>>,
    }

    #[async_trait]
    impl ResourceFetcher for Host {
        async fn fetch_resource(&self, path: &ImagePath, size: ImageSize) -> Result<Bytes, TransportError> {
            self.requests.lock().unwrap().push((path.clone(), size));
            Ok(self.body.clone())
        }
    }

    fn host(body: Bytes) -> Arc<Host> {
        Arc::new(Host {
            body,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn configuration() -> ImageConfiguration {
        ImageConfiguration {
            base_url: "http://image.tmdb.org/t/p/".to_string(),
            secure_base_url: "https://image.tmdb.org/t/p/".to_string(),
            backdrop_sizes: vec!["w300".to_string(), "original".to_string()],
            logo_sizes: Vec::new(),
            poster_sizes: vec!["w92".to_string(), "w500".to_string(), "original".to_string()],
            profile_sizes: Vec::new(),
            still_sizes: Vec::new(),
        }
    }

    fn png() -> Bytes {
        let mut buffer = Cursor::new(Vec::new());
        image::RgbaImage::new(3, 2)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let host = host(png());
        let cache: Arc<MemoryCache<Image>> = Arc::new(MemoryCache::new(1024 * 1024));
        let service = ImageService::new(configuration(), host.clone(), cache.clone());
        let poster = ImagePath::Poster("/poster.jpg".to_string());

        let first = service.image(&poster, ImageSize::Small).await.unwrap();
        assert!(!first.was_cached);
        assert_eq!(first.resource.width(), 3);
        assert_eq!(first.resource.cost(), 3 * 2 * 4);

        let second = service.image(&poster, ImageSize::Small).await.unwrap();
        assert!(second.was_cached);
        assert_eq!(second.resource, first.resource);

        assert_eq!(host.requests.lock().unwrap().len(), 1);
        assert!(cache.tier().contains("w92/poster.jpg"));
    }

    #[tokio::test]
    async fn test_undecodable_download_is_not_cached() {
        let host = host(Bytes::from_static(b"<html>502</html>"));
        let cache: Arc<MemoryCache<Image>> = Arc::new(MemoryCache::new(1024 * 1024));
        let service = ImageService::new(configuration(), host.clone(), cache.clone());
        let poster = ImagePath::Poster("/poster.jpg".to_string());

        let err = service.image(&poster, ImageSize::Original).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(DecodeError::InvalidImage { .. })));
        assert!(!cache.tier().contains("original/poster.jpg"));
    }

    #[tokio::test]
    async fn test_missing_size_fails_before_fetching() {
        let host = host(png());
        let service = ImageService::new(
            configuration(),
            host.clone(),
            Arc::new(MemoryCache::<Image>::new(1024 * 1024)),
        );

        let err = service
            .image(&ImagePath::Logo("/logo.png".to_string()), ImageSize::Small)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Decode(DecodeError::MissingImageSizes { kind: "logo" })
        ));
        assert!(host.requests.lock().unwrap().is_empty());
    }
}
