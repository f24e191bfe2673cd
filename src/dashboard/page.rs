//! Filtered, paginated view over a shared record collection.

use std::ops::Range;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use super::filter::{FilterState, Filterable};

/// What happens to the current page when the filter or the source collection changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageResetPolicy {
    /// Keep the page number, clamped into the new page range.
    #[default]
    #[serde(rename = "clamp")]
    ClampToRange,
    /// Jump back to page 1.
    #[serde(rename = "first")]
    ResetToFirst,
}

/// 1-based page cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageState {
    pub current_page: usize,
    pub page_size: usize,
}

/// Visible page of `source` after applying a `FilterState`.
///
/// The filtered index list is recomputed whenever the source (by `Arc` identity) or the
/// filter changes; the current page always stays within `1..=total_pages()`.
pub struct FilteredPage<T> {
    source: Arc<Vec<T>>,
    filter: FilterState,
    page: PageState,
    policy: PageResetPolicy,
    filtered: Vec<usize>,
    matcher: SkimMatcherV2,
}

impl<T: Filterable> FilteredPage<T> {
    pub fn new(page_size: usize, policy: PageResetPolicy) -> Self {
        Self {
            source: Arc::new(Vec::new()),
            filter: FilterState::default(),
            page: PageState {
                current_page: 1,
                page_size: page_size.max(1),
            },
            policy,
            filtered: Vec::new(),
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Replace the source collection. Returns false when `source` is the same allocation.
    pub fn set_source(&mut self, source: Arc<Vec<T>>) -> bool {
        if Arc::ptr_eq(&self.source, &source) {
            return false;
        }
        self.source = source;
        self.recompute();
        true
    }

    /// Replace the filter. Returns false when nothing changed.
    pub fn set_filter(&mut self, filter: FilterState) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.recompute();
        true
    }

    /// Edit a copy of the current filter and apply it.
    pub fn update_filter(&mut self, edit: impl FnOnce(&mut FilterState)) -> bool {
        let mut next = self.filter.clone();
        edit(&mut next);
        self.set_filter(next)
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page.page_size = page_size.max(1);
        self.clamp_page();
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn source(&self) -> &Arc<Vec<T>> {
        &self.source
    }

    pub fn page_state(&self) -> PageState {
        self.page
    }

    pub fn current_page(&self) -> usize {
        self.page.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page.page_size
    }

    /// Number of records passing the filter.
    pub fn total_items(&self) -> usize {
        self.filtered.len()
    }

    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page.page_size).max(1)
    }

    /// Positions within the filtered list shown on the current page.
    pub fn visible_range(&self) -> Range<usize> {
        let start = (self.page.current_page - 1) * self.page.page_size;
        let end = (start + self.page.page_size).min(self.filtered.len());
        start.min(end)..end
    }

    pub fn visible(&self) -> impl Iterator<Item = &T> {
        self.filtered[self.visible_range()]
            .iter()
            .filter_map(|&index| self.source.get(index))
    }

    /// All records passing the filter, in source order.
    pub fn filtered(&self) -> impl Iterator<Item = &T> {
        self.filtered
            .iter()
            .filter_map(|&index| self.source.get(index))
    }

    pub fn first_page(&mut self) -> usize {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> usize {
        self.go_to_page(self.total_pages())
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to_page(self.page.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.go_to_page(self.page.current_page.saturating_sub(1))
    }

    /// Move to page `n`, clamped into `1..=total_pages()`.
    pub fn go_to_page(&mut self, n: usize) -> usize {
        self.page.current_page = n.clamp(1, self.total_pages());
        self.page.current_page
    }

    fn recompute(&mut self) {
        let predicate = self.filter.predicate(&self.matcher);
        self.filtered = self
            .source
            .iter()
            .enumerate()
            .filter(|(_, record)| predicate.matches(*record))
            .map(|(index, _)| index)
            .collect();
        if self.policy == PageResetPolicy::ResetToFirst {
            self.page.current_page = 1;
        }
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        self.page.current_page = self.page.current_page.clamp(1, self.total_pages());
    }
}
