//! Data models for catalog pages and artwork.

mod artwork;
mod film;
mod page;
mod paginated_list;

pub use artwork::*;
pub use film::*;
pub use page::*;
pub use paginated_list::*;
