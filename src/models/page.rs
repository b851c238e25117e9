//! Server page model.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::DecodeError;

/// One server-delivered chunk of a paginated result set.
///
/// `page_index` is 0-based; the wire format is 1-based and converted in
/// [`Page::decode`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    page_index: usize,
    total_results: usize,
    total_pages: usize,
    items: Vec<T>,
}

/// Wire representation of a page envelope.
#[derive(Debug, Deserialize)]
struct PageEnvelope<T> {
    page: usize,
    total_results: usize,
    total_pages: usize,
    results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(page_index: usize, total_results: usize, total_pages: usize, items: Vec<T>) -> Self {
        Self {
            page_index,
            total_results,
            total_pages,
            items,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total_results(&self) -> usize {
        self.total_results
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Index of the page following this one.
    pub fn next_page_index(&self) -> usize {
        self.page_index + 1
    }

    /// Whether the server has at least one page after this one.
    pub fn has_next_page(&self) -> bool {
        self.next_page_index() < self.total_pages
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decodes a JSON page envelope.
    ///
    /// Fails on missing or malformed fields and on a wire page number of 0.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let envelope: PageEnvelope<T> = serde_json::from_slice(data)?;
        envelope.into_page()
    }
}

impl<T> PageEnvelope<T> {
    fn into_page(self) -> Result<Page<T>, DecodeError> {
        let page_index = self.page.checked_sub(1).ok_or(DecodeError::ZeroWirePage)?;
        Ok(Page::new(
            page_index,
            self.total_results,
            self.total_pages,
            self.results,
        ))
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(page: usize, total_pages: usize, results: &[u32]) -> String {
        format!(
            r#"{{"page":{},"total_results":{},"total_pages":{},"results":{:?}}}"#,
            page,
            total_pages * 20,
            total_pages,
            results
        )
    }

    #[test]
    fn test_properties() {
        let first: Vec<u32> = (1..=20).collect();
        let last: Vec<u32> = (21..=40).collect();

        let first_page = Page::new(0, 40, 2, first.clone());
        assert_eq!(first_page.len(), 20);
        assert_eq!(first_page.page_index(), 0);
        assert_eq!(first_page.total_results(), 40);
        assert_eq!(first_page.total_pages(), 2);
        assert!(first_page.has_next_page());
        assert_eq!(first_page.next_page_index(), 1);
        assert_eq!(first_page.items(), first.as_slice());

        let last_page = Page::new(1, 40, 2, last.clone());
        assert!(!last_page.has_next_page());
        assert_eq!(last_page.next_page_index(), 2);
        assert_eq!(last_page.iter().copied().collect::<Vec<_>>(), last);

        let empty: Page<u32> = Page::new(0, 0, 0, vec![]);
        assert!(empty.is_empty());
        assert!(!empty.has_next_page());
        assert_eq!(empty.next_page_index(), 1);
    }

    #[test]
    fn test_decode_converts_wire_page_to_zero_based() {
        let page: Page<u32> = Page::decode(envelope(1, 992, &[1, 2, 3]).as_bytes()).unwrap();
        assert_eq!(page.page_index(), 0);
        assert_eq!(page.total_pages(), 992);
        assert_eq!(page.total_results(), 992 * 20);
        assert_eq!(page.items(), &[1, 2, 3]);
        assert!(page.has_next_page());

        let page: Page<u32> = Page::decode(envelope(5, 10, &[]).as_bytes()).unwrap();
        assert_eq!(page.page_index(), 4);
        assert_eq!(page.next_page_index(), 5);
    }

    #[test]
    fn test_decode_rejects_zero_wire_page() {
        let err = Page::<u32>::decode(envelope(0, 1, &[1]).as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::ZeroWirePage));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let err = Page::<u32>::decode(br#"{"page":1,"total_pages":1,"results":[]}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));

        let err = Page::<u32>::decode(br#"{"page":1,"total_results":1,"total_pages":1,"results":["x"]}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }
}
