//! Client-side accumulation of server pages.

use std::ops::{Index, Range};

use super::page::Page;
use crate::error::PaginationError;

/// The most recent structural change applied to a [`PaginatedList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mutation {
    /// The list was created, either empty or from its first page.
    #[default]
    Created,
    /// The page with the given index was appended.
    PageAppended(usize),
}

impl Mutation {
    pub fn is_created(&self) -> bool {
        matches!(self, Mutation::Created)
    }
}

/// An append-only concatenation of every page absorbed so far.
///
/// Pages must arrive strictly in order starting at index 0. Indices into
/// the list are stable: appending a page never renumbers existing items.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedList<T> {
    contents: Vec<T>,
    page_ranges: Vec<Range<usize>>,
    last_mutation: Mutation,
    has_more_content: bool,
}

impl<T> PaginatedList<T> {
    /// Returns a list with no pages.
    pub fn empty() -> Self {
        Self {
            contents: Vec::new(),
            page_ranges: Vec::new(),
            last_mutation: Mutation::Created,
            has_more_content: false,
        }
    }

    /// Creates a list from the first page of a result set.
    pub fn from_first_page(page: Page<T>) -> Result<Self, PaginationError> {
        if page.page_index() != 0 {
            return Err(PaginationError::InitialPageIndexNotZero(page.page_index()));
        }
        let has_more_content = page.has_next_page();
        let contents = page.into_items();
        Ok(Self {
            page_ranges: vec![0..contents.len()],
            contents,
            last_mutation: Mutation::Created,
            has_more_content,
        })
    }

    /// Absorbs the next page in place.
    ///
    /// On error the list is left untouched.
    pub fn append(&mut self, page: Page<T>) -> Result<(), PaginationError> {
        let expected = self.page_ranges.len();
        if expected == 0 {
            *self = Self::from_first_page(page)?;
            return Ok(());
        }
        if page.page_index() != expected {
            return Err(PaginationError::WrongNextPageIndex {
                got: page.page_index(),
                expected,
            });
        }

        let has_more_content = page.has_next_page();
        let start = self.contents.len();
        self.contents.extend(page.into_items());
        self.page_ranges.push(start..self.contents.len());
        self.last_mutation = Mutation::PageAppended(expected);
        self.has_more_content = has_more_content;
        Ok(())
    }

    /// Returns a copy of this list with `page` absorbed, leaving `self` as is.
    pub fn appending(&self, page: Page<T>) -> Result<Self, PaginationError>
    where
        T: Clone,
    {
        let mut list = self.clone();
        list.append(page)?;
        Ok(list)
    }

    /// Items carried by absorbed page `i`.
    ///
    /// # Panics
    ///
    /// Panics if page `i` has not been absorbed.
    pub fn items_of_page(&self, i: usize) -> &[T] {
        &self.contents[self.page_range(i)]
    }

    /// Index range of absorbed page `i` within the list.
    ///
    /// # Panics
    ///
    /// Panics if page `i` has not been absorbed.
    pub fn page_range(&self, i: usize) -> Range<usize> {
        self.page_ranges[i].clone()
    }

    /// Number of pages absorbed so far.
    pub fn page_count(&self) -> usize {
        self.page_ranges.len()
    }

    /// Index of the page this list expects next.
    pub fn next_page_index(&self) -> usize {
        self.page_ranges.len()
    }

    pub fn last_mutation(&self) -> Mutation {
        self.last_mutation
    }

    pub fn has_more_content(&self) -> bool {
        self.has_more_content
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.contents.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.contents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.contents.iter()
    }
}

impl<T> Default for PaginatedList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Index<usize> for PaginatedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.contents[index]
    }
}

impl<'a, T> IntoIterator for &'a PaginatedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.contents.iter()
    }
}
