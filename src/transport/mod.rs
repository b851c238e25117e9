//! Remote catalog boundary: endpoints, page requests and fetcher traits.

mod http;

pub use http::*;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{FetchResult, TransportError};
use crate::models::{ImagePath, ImageSize, Page};

/// Direction of a discover sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Ascending),
            "desc" | "descending" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// Field the discover endpoint sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilmSortingCriterion {
    Popularity,
    ReleaseDate,
    Revenue,
    PrimaryReleaseDate,
    OriginalTitle,
    VoteAverage,
    VoteCount,
}

impl FilmSortingCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmSortingCriterion::Popularity => "popularity",
            FilmSortingCriterion::ReleaseDate => "release_date",
            FilmSortingCriterion::Revenue => "revenue",
            FilmSortingCriterion::PrimaryReleaseDate => "primary_release_date",
            FilmSortingCriterion::OriginalTitle => "original_title",
            FilmSortingCriterion::VoteAverage => "vote_average",
            FilmSortingCriterion::VoteCount => "vote_count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "popularity" => Some(FilmSortingCriterion::Popularity),
            "release_date" => Some(FilmSortingCriterion::ReleaseDate),
            "revenue" => Some(FilmSortingCriterion::Revenue),
            "primary_release_date" => Some(FilmSortingCriterion::PrimaryReleaseDate),
            "original_title" => Some(FilmSortingCriterion::OriginalTitle),
            "vote_average" => Some(FilmSortingCriterion::VoteAverage),
            "vote_count" => Some(FilmSortingCriterion::VoteCount),
            _ => None,
        }
    }
}

/// Parameters of the discover endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoverParameters {
    pub sort_by: FilmSortingCriterion,
    pub order: SortOrder,
}

impl DiscoverParameters {
    pub fn new(sort_by: FilmSortingCriterion, order: SortOrder) -> Self {
        Self { sort_by, order }
    }

    /// Value of the `sort_by` query parameter, e.g. `popularity.desc`.
    pub fn sort_value(&self) -> String {
        format!("{}.{}", self.sort_by.as_str(), self.order.as_str())
    }
}

impl Default for DiscoverParameters {
    fn default() -> Self {
        Self::new(FilmSortingCriterion::Popularity, SortOrder::Descending)
    }
}

/// Parameters of the film search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchParameters {
    pub query: String,
    pub language: Option<String>,
    pub include_adult: bool,
    pub year: Option<u16>,
    pub primary_release_year: Option<u16>,
}

impl SearchParameters {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// A remote API endpoint together with its endpoint-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Configuration,
    SearchFilms(SearchParameters),
    PopularFilms,
    UpcomingFilms,
    DiscoverFilms(DiscoverParameters),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Configuration => "/3/configuration".to_string(),
            Endpoint::SearchFilms(_) => "/3/search/movie".to_string(),
            Endpoint::PopularFilms => "/3/movie/popular".to_string(),
            Endpoint::UpcomingFilms => "/3/movie/upcoming".to_string(),
            Endpoint::DiscoverFilms(_) => "/3/discover/movie".to_string(),
        }
    }

    /// Whether the endpoint returns a page envelope.
    pub fn is_paged(&self) -> bool {
        matches!(
            self,
            Endpoint::SearchFilms(_)
                | Endpoint::PopularFilms
                | Endpoint::UpcomingFilms
                | Endpoint::DiscoverFilms(_)
        )
    }

    /// Endpoint-specific query parameters, excluding `page`.
    pub fn parameters(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        match self {
            Endpoint::SearchFilms(search) => {
                params.push(("query".to_string(), search.query.clone()));
                if let Some(language) = &search.language {
                    params.push(("language".to_string(), language.clone()));
                }
                if search.include_adult {
                    params.push(("include_adult".to_string(), "true".to_string()));
                }
                if let Some(year) = search.year {
                    params.push(("year".to_string(), year.to_string()));
                }
                if let Some(year) = search.primary_release_year {
                    params.push(("primary_release_year".to_string(), year.to_string()));
                }
            }
            Endpoint::DiscoverFilms(discover) => {
                params.push(("sort_by".to_string(), discover.sort_value()));
            }
            _ => {}
        }
        params
    }
}

/// A request for one page of a paged endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    endpoint: Endpoint,
    page_index: usize,
}

impl PageRequest {
    /// Request for the first page of `endpoint`.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            page_index: 0,
        }
    }

    pub fn popular() -> Self {
        Self::new(Endpoint::PopularFilms)
    }

    pub fn upcoming() -> Self {
        Self::new(Endpoint::UpcomingFilms)
    }

    pub fn search(parameters: SearchParameters) -> Self {
        Self::new(Endpoint::SearchFilms(parameters))
    }

    pub fn discover(parameters: DiscoverParameters) -> Self {
        Self::new(Endpoint::DiscoverFilms(parameters))
    }

    /// The same request targeting page `page_index`.
    pub fn for_page(&self, page_index: usize) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            page_index,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Query parameters of the request. The wire `page` is 1-based.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut params = self.endpoint.parameters();
        params.push(("page".to_string(), (self.page_index + 1).to_string()));
        params
    }
}

/// Source of catalog pages.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    /// Fetches the page described by `request`.
    ///
    /// The returned page's index must be `request.page_index()` for the
    /// pagination contract to hold; the session validates it.
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<Page<T>>;
}

/// Source of raw image bytes.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_resource(&self, path: &ImagePath, size: ImageSize) -> Result<Bytes, TransportError>;
}
