//! Image sizes, paths, configuration and the decoded image resource.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DecodeError;
use crate::storage::CacheResource;

/// Requested rendition of an image, mapped onto the sizes the API offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSize {
    Small,
    Medium,
    Big,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Medium => "medium",
            ImageSize::Big => "big",
            ImageSize::Original => "original",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "small" => Some(ImageSize::Small),
            "medium" => Some(ImageSize::Medium),
            "big" => Some(ImageSize::Big),
            "original" => Some(ImageSize::Original),
            _ => None,
        }
    }

    /// Picks this size's entry from an ascending list of API sizes.
    fn pick(self, sizes: &[String]) -> Option<&str> {
        let last = sizes.len().checked_sub(1)?;
        let index = match self {
            ImageSize::Small => 0,
            ImageSize::Medium => sizes.len() / 2,
            ImageSize::Big => last.saturating_sub(1),
            ImageSize::Original => last,
        };
        sizes.get(index).map(String::as_str)
    }
}

/// A remote image path tagged with the kind of image it designates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImagePath {
    Backdrop(String),
    Logo(String),
    Poster(String),
    Profile(String),
    Still(String),
}

impl ImagePath {
    /// Builds a path from a kind name as returned by [`ImagePath::kind`].
    pub fn new(kind: &str, path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        match kind.to_lowercase().as_str() {
            "backdrop" => Some(ImagePath::Backdrop(path)),
            "logo" => Some(ImagePath::Logo(path)),
            "poster" => Some(ImagePath::Poster(path)),
            "profile" => Some(ImagePath::Profile(path)),
            "still" => Some(ImagePath::Still(path)),
            _ => None,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ImagePath::Backdrop(path)
            | ImagePath::Logo(path)
            | ImagePath::Poster(path)
            | ImagePath::Profile(path)
            | ImagePath::Still(path) => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ImagePath::Backdrop(_) => "backdrop",
            ImagePath::Logo(_) => "logo",
            ImagePath::Poster(_) => "poster",
            ImagePath::Profile(_) => "profile",
            ImagePath::Still(_) => "still",
        }
    }
}

/// Image section of the API configuration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfiguration {
    pub base_url: String,
    pub secure_base_url: String,
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    #[serde(default)]
    pub logo_sizes: Vec<String>,
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    #[serde(default)]
    pub profile_sizes: Vec<String>,
    #[serde(default)]
    pub still_sizes: Vec<String>,
}

#[derive(Deserialize)]
struct ConfigurationEnvelope {
    images: ImageConfiguration,
}

impl ImageConfiguration {
    /// Decodes the body of the configuration endpoint.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let envelope: ConfigurationEnvelope = serde_json::from_slice(data)?;
        Ok(envelope.images)
    }

    fn sizes_for(&self, path: &ImagePath) -> &[String] {
        match path {
            ImagePath::Backdrop(_) => &self.backdrop_sizes,
            ImagePath::Logo(_) => &self.logo_sizes,
            ImagePath::Poster(_) => &self.poster_sizes,
            ImagePath::Profile(_) => &self.profile_sizes,
            ImagePath::Still(_) => &self.still_sizes,
        }
    }

    /// The API size component (e.g. `w500`) for `size` of `path`'s kind.
    pub fn size_component(&self, size: ImageSize, path: &ImagePath) -> Result<&str, DecodeError> {
        size.pick(self.sizes_for(path))
            .ok_or(DecodeError::MissingImageSizes { kind: path.kind() })
    }

    /// Cache key for a size tier and resource path: `<size>/<path>`.
    pub fn cache_key(&self, size: ImageSize, path: &ImagePath) -> Result<String, DecodeError> {
        let size = self.size_component(size, path)?;
        Ok(format!("{}/{}", size, path.path().trim_start_matches('/')))
    }

    /// Absolute URL of the image on the secure image host.
    pub fn url(&self, size: ImageSize, path: &ImagePath) -> Result<Url, DecodeError> {
        let key = self.cache_key(size, path)?;
        let mut base = self.secure_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base)
            .and_then(|b| b.join(&key))
            .map_err(|e| DecodeError::InvalidImage {
                len: 0,
                reason: format!("bad image URL {}{}: {}", base, key, e),
            })
    }
}

/// A downloaded image: the encoded bytes plus decoded dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Bytes,
    width: u32,
    height: u32,
}

impl Image {
    /// Decodes the whole payload to validate it and learn its size.
    ///
    /// Only the encoded bytes are kept; the bitmap is discarded.
    pub fn decode(data: Bytes) -> Result<Self, DecodeError> {
        let decoded = image::load_from_memory(&data).map_err(|e| DecodeError::InvalidImage {
            len: data.len(),
            reason: e.to_string(),
        })?;
        let (width, height) = (decoded.width(), decoded.height());

        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Estimated memory footprint of the decoded bitmap (RGBA rows).
    pub fn decoded_size(&self) -> u64 {
        let bitmap = u64::from(self.width) * 4 * u64::from(self.height);
        if bitmap == 0 {
            self.data.len() as u64
        } else {
            bitmap
        }
    }
}

impl CacheResource for Image {
    fn cost(&self) -> u32 {
        u32::try_from(self.decoded_size()).unwrap_or(u32::MAX)
    }

    fn to_bytes(&self) -> Bytes {
        self.data.clone()
    }

    fn from_bytes(data: Bytes) -> Result<Self, DecodeError> {
        Image::decode(data)
    }
}
