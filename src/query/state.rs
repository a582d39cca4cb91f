//! Filter, sort, page and selection state of one list screen.
//!
//! The store is the only place this state changes. Each action keeps the
//! selection honest: whenever the visible rows may change, selected row
//! identifiers are dropped since they could point at rows no longer shown.

use super::filters::{normalize_search, FilterSelection};
use super::url;
use super::{QueryError, QueryKey};
use crate::preferences::{PreferenceStore, DEFAULT_PAGE_SIZE, PAGE_SIZES};
use log::*;
use reqwest::Url;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Sort direction.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// Active sort of a screen.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SortOrder<C: QueryKey> {
    pub column: C,
    pub direction: Direction,
}

impl<C: QueryKey> SortOrder<C> {
    pub fn ascending(column: C) -> Self {
        SortOrder {
            column,
            direction: Direction::Ascending,
        }
    }

    pub fn descending(column: C) -> Self {
        SortOrder {
            column,
            direction: Direction::Descending,
        }
    }
}

/// Per-screen behaviour of the store.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Index of the first page, `0` or `1`.
    pub first_page: u32,
    /// Whether changing the sort sends the user back to the first page.
    pub reset_page_on_order: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            first_page: 0,
            reset_page_on_order: false,
        }
    }
}

/// Mutable list state owned by a single screen.
///
pub struct ListStore<F: QueryKey, C: QueryKey> {
    config: StoreConfig,
    preferences: Arc<dyn PreferenceStore>,
    filters: FilterSelection<F>,
    search: Option<String>,
    order: Option<SortOrder<C>>,
    page: u32,
    limit: u32,
    selection: BTreeSet<u64>,
    location: Option<Url>,
}

impl<F: QueryKey, C: QueryKey> ListStore<F, C> {
    /// Return a store with screen defaults. The page size comes from the
    /// shared preference when one was saved.
    ///
    pub fn new(config: StoreConfig, preferences: Arc<dyn PreferenceStore>) -> Self {
        let limit = preferences.page_size().unwrap_or(DEFAULT_PAGE_SIZE);
        ListStore {
            page: config.first_page,
            config,
            preferences,
            filters: FilterSelection::new(),
            search: None,
            order: None,
            limit,
            selection: BTreeSet::new(),
            location: None,
        }
    }

    /// Seed filters and search from a location once, at mount. Later changes
    /// are mirrored back into this location.
    ///
    pub fn seed_from_location(&mut self, location: Url) {
        let (filters, search) = url::read_location::<F>(&location);
        debug!(
            "Seeding list state from {} ({} filter key(s), search: {:?})",
            location,
            filters.iter().count(),
            search
        );
        self.filters = filters;
        self.search = search;
        self.location = Some(location);
    }

    pub fn set_filters(&mut self, filters: FilterSelection<F>) {
        self.filters = filters;
        self.reset_page();
        self.clear_selection();
        self.mirror();
    }

    pub fn set_search(&mut self, term: Option<String>) {
        self.search = normalize_search(term);
        self.reset_page();
        self.clear_selection();
        self.mirror();
    }

    pub fn set_order(&mut self, order: Option<SortOrder<C>>) {
        self.order = order;
        if self.config.reset_page_on_order {
            self.reset_page();
        }
        self.clear_selection();
    }

    /// Move to a page; `None` goes back to the first one.
    ///
    pub fn set_page(&mut self, page: Option<u32>) {
        self.page = page
            .unwrap_or(self.config.first_page)
            .max(self.config.first_page);
        self.clear_selection();
    }

    /// Change the page size and remember it for every screen. `None`
    /// restores the default size.
    ///
    pub fn set_limit(&mut self, limit: Option<u32>) -> Result<(), QueryError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !PAGE_SIZES.contains(&limit) {
            return Err(QueryError::UnsupportedPageSize {
                size: limit,
                allowed: PAGE_SIZES,
            });
        }
        self.limit = limit;
        if let Err(e) = self.preferences.set_page_size(limit) {
            warn!("Failed to remember page size {}: {}", limit, e);
        }
        self.reset_page();
        self.clear_selection();
        Ok(())
    }

    pub fn set_selection<I: IntoIterator<Item = u64>>(&mut self, ids: I) {
        self.selection = ids.into_iter().collect();
    }

    pub fn filters(&self) -> &FilterSelection<F> {
        &self.filters
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn order(&self) -> Option<SortOrder<C>> {
        self.order
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn selection(&self) -> &BTreeSet<u64> {
        &self.selection
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    fn reset_page(&mut self) {
        self.page = self.config.first_page;
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn mirror(&mut self) {
        if let Some(location) = self.location.as_mut() {
            url::write_location(location, &self.filters, self.search.as_deref());
        }
    }
}
