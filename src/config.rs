//! Client configuration.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ImageSize;
use crate::storage::default_memory_budget;
use crate::transport::{
    DiscoverParameters, FilmSortingCriterion, PageRequest, SearchParameters, ServiceConfiguration,
    SortOrder, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
};

/// Quiet period before a reload or search restarts a feed.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);

/// Quiet period before a next-page request reaches the session.
pub const NEXT_PAGE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Pages listed by the CLI when `--pages` is not given.
pub const DEFAULT_PAGES: usize = 1;

/// Command-line arguments for the client.
#[derive(Parser, Debug, Clone)]
#[command(name = "whatfilm-rs")]
#[command(about = "Browse a movie catalog with a tiered image cache")]
#[command(version)]
pub struct Args {
    /// API key sent with every request.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Base URL of the catalog API.
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Directory for the on-disk image cache.
    #[arg(long, short = 'l')]
    pub cache_dir: Option<PathBuf>,

    /// In-memory mode (no image persistence).
    #[arg(long)]
    pub in_memory: bool,

    /// Memory tier budget in bytes (defaults to a share of physical memory).
    #[arg(long)]
    pub memory_budget: Option<u64>,

    /// Enable debug logging.
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Enable silent mode (minimal logging).
    #[arg(long, short = 's')]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What the client should do.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List popular films.
    Popular {
        #[arg(long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
    },
    /// List upcoming films.
    Upcoming {
        #[arg(long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
    },
    /// Search films by title.
    Search {
        query: String,
        #[arg(long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        include_adult: bool,
    },
    /// Discover films sorted by a criterion.
    Discover {
        #[arg(long, default_value = "popularity", value_parser = parse_criterion)]
        sort_by: FilmSortingCriterion,
        #[arg(long, default_value = "desc", value_parser = parse_order)]
        order: SortOrder,
        #[arg(long, default_value_t = DEFAULT_PAGES)]
        pages: usize,
    },
    /// Fetch one image through the cache.
    Image {
        /// Image path as returned by the API, e.g. `/abc.jpg`.
        path: String,
        /// poster, backdrop, logo, profile or still.
        #[arg(long, default_value = "poster")]
        kind: String,
        #[arg(long, default_value = "medium", value_parser = parse_size)]
        size: ImageSize,
        /// Write the image bytes to this file.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

fn parse_criterion(s: &str) -> Result<FilmSortingCriterion, String> {
    FilmSortingCriterion::from_str(s).ok_or_else(|| format!("unknown sort criterion '{}'", s))
}

fn parse_order(s: &str) -> Result<SortOrder, String> {
    SortOrder::from_str(s).ok_or_else(|| format!("unknown sort order '{}'", s))
}

fn parse_size(s: &str) -> Result<ImageSize, String> {
    ImageSize::from_str(s).ok_or_else(|| format!("unknown image size '{}'", s))
}

impl Command {
    /// The listing request and page count, for listing commands.
    pub fn listing(&self) -> Option<(PageRequest, usize)> {
        match self {
            Command::Popular { pages } => Some((PageRequest::popular(), *pages)),
            Command::Upcoming { pages } => Some((PageRequest::upcoming(), *pages)),
            Command::Search {
                query,
                pages,
                language,
                year,
                include_adult,
            } => {
                let parameters = SearchParameters {
                    query: query.clone(),
                    language: language.clone(),
                    include_adult: *include_adult,
                    year: *year,
                    primary_release_year: None,
                };
                Some((PageRequest::search(parameters), *pages))
            }
            Command::Discover {
                sort_by,
                order,
                pages,
            } => Some((
                PageRequest::discover(DiscoverParameters::new(*sort_by, *order)),
                *pages,
            )),
            Command::Image { .. } => None,
        }
    }
}

/// Client configuration derived from command-line arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the catalog API.
    pub api_url: String,
    /// API key sent with every request.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Directory for the on-disk image cache.
    pub cache_dir: Option<PathBuf>,
    /// In-memory mode (no image persistence).
    pub in_memory: bool,
    /// Memory tier budget override.
    pub memory_budget: Option<u64>,
    /// Enable debug logging.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_dir: None,
            in_memory: true,
            memory_budget: None,
            debug: false,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let in_memory = args.in_memory || args.cache_dir.is_none();
        Self {
            api_url: args.api_url,
            api_key: args.api_key,
            timeout: Duration::from_secs(args.timeout),
            cache_dir: args.cache_dir,
            in_memory,
            memory_budget: args.memory_budget,
            debug: args.debug,
        }
    }
}

impl Config {
    /// Request settings for the catalog client.
    pub fn service_configuration(&self) -> ServiceConfiguration {
        let default_parameters = self
            .api_key
            .iter()
            .map(|key| ("api_key".to_string(), key.clone()))
            .collect();
        ServiceConfiguration {
            base_url: self.api_url.clone(),
            default_parameters,
            timeout: self.timeout,
        }
    }

    /// Memory tier budget, falling back to a share of physical memory.
    pub fn memory_budget(&self) -> u64 {
        self.memory_budget.unwrap_or_else(default_memory_budget)
    }
}
