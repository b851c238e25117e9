//! Film catalog record.

use serde::{Deserialize, Serialize};

use super::artwork::ImagePath;

/// A film as listed in catalog pages (search, popular, upcoming, discover).
///
/// Only the fields the client needs are mapped; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

impl Film {
    /// Title followed by the release year, when known.
    pub fn full_title(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    /// Year component of an ISO-8601 release date.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }

    pub fn poster(&self) -> Option<ImagePath> {
        self.poster_path.clone().map(ImagePath::Poster)
    }

    pub fn backdrop(&self) -> Option<ImagePath> {
        self.backdrop_path.clone().map(ImagePath::Backdrop)
    }
}

/// Drops films whose id already appeared earlier in the sequence.
pub fn without_duplicates<'a>(films: impl IntoIterator<Item = &'a Film>) -> Vec<&'a Film> {
    let mut seen = std::collections::HashSet::new();
    films.into_iter().filter(|f| seen.insert(f.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;

    const POPULAR_PAGE: &str = r#"{
        "page": 1,
        "total_results": 19829,
        "total_pages": 992,
        "results": [
            {
                "id": 337167,
                "title": "Fifty Shades Freed",
                "original_title": "Fifty Shades Freed",
                "overview": "Believing they have left behind shadowy figures from their past...",
                "release_date": "2018-02-07",
                "poster_path": "/jjPJ4s3DWZZvI4vw8Xfi4Vqa1Q8.jpg",
                "backdrop_path": "/9ywA15OAiwjSTvg3cBs9B7kOCBF.jpg",
                "popularity": 631.773,
                "vote_average": 6.2,
                "vote_count": 1162,
                "adult": false,
                "genre_ids": [18, 10749]
            },
            {
                "id": 284054,
                "title": "Black Panther",
                "release_date": "",
                "poster_path": null,
                "backdrop_path": null
            }
        ]
    }"#;

    #[test]
    fn test_decode_page_of_films() {
        let page: Page<Film> = Page::decode(POPULAR_PAGE.as_bytes()).unwrap();
        assert_eq!(page.page_index(), 0);
        assert_eq!(page.total_results(), 19829);
        assert_eq!(page.total_pages(), 992);
        assert_eq!(page.len(), 2);

        let first = &page.items()[0];
        assert_eq!(first.full_title(), "Fifty Shades Freed (2018)");
        assert_eq!(
            first.poster(),
            Some(ImagePath::Poster("/jjPJ4s3DWZZvI4vw8Xfi4Vqa1Q8.jpg".to_string()))
        );

        let second = &page.items()[1];
        assert_eq!(second.full_title(), "Black Panther");
        assert!(second.poster().is_none());
        assert!(second.backdrop().is_none());
    }

    #[test]
    fn test_without_duplicates() {
        let page: Page<Film> = Page::decode(POPULAR_PAGE.as_bytes()).unwrap();
        let mut films = page.into_items();
        films.push(films[0].clone());

        let unique = without_duplicates(&films);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, 337167);
        assert_eq!(unique[1].id, 284054);
    }
}
