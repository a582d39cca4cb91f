//! Derivation of the immutable list query from store state and screen
//! context.

use super::state::{ListStore, SortOrder};
use super::QueryKey;
use std::collections::{BTreeMap, BTreeSet};

/// Fixed context of a screen, merged into every query it builds.
///
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct QueryContext {
    /// Organization whose data is listed.
    pub entity_id: u64,
    pub year: Option<i32>,
    /// Active tab of the screen.
    pub category: Option<String>,
    /// Status implied by the active tab.
    pub status: Option<String>,
}

impl QueryContext {
    pub fn new(entity_id: u64) -> Self {
        QueryContext {
            entity_id,
            ..QueryContext::default()
        }
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Parameters sent to a list endpoint. Two queries are equal when every
/// field is, which is what drives re-fetching.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListQuery<F: QueryKey, C: QueryKey> {
    pub context: QueryContext,
    /// Only keys with at least one value.
    pub filters: BTreeMap<F, BTreeSet<String>>,
    pub search: Option<String>,
    pub order: Option<SortOrder<C>>,
    /// Zero-based, whatever the origin used by the screen.
    pub page_index: u32,
    pub limit: u32,
}

/// Build the query for the current state of a store.
///
pub fn build_query<F: QueryKey, C: QueryKey>(
    store: &ListStore<F, C>,
    context: &QueryContext,
) -> ListQuery<F, C> {
    ListQuery {
        context: context.clone(),
        filters: store.filters().normalized(),
        search: store.search().map(str::to_owned),
        order: store.order(),
        page_index: store.page().saturating_sub(store.config().first_page),
        limit: store.limit(),
    }
}

impl<F: QueryKey, C: QueryKey> ListQuery<F, C> {
    /// Index of the first row of the requested page.
    ///
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.limit)
    }

    /// Same query without one filter, used to ask which values that filter
    /// can still take given every other active filter.
    ///
    pub fn without_filter(&self, key: F) -> Self {
        let mut query = self.clone();
        query.filters.remove(&key);
        query
    }

    /// Render the query as request parameters, one pair per filter value. A
    /// `status` filter replaces the status implied by the context.
    ///
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("entity_id".to_owned(), self.context.entity_id.to_string())];
        if let Some(year) = self.context.year {
            params.push(("year".to_owned(), year.to_string()));
        }
        if let Some(category) = &self.context.category {
            params.push(("category".to_owned(), category.clone()));
        }
        let status_filtered = self.filters.keys().any(|key| key.as_str() == "status");
        if let Some(status) = self.context.status.as_ref().filter(|_| !status_filtered) {
            params.push(("status".to_owned(), status.clone()));
        }
        for (key, values) in &self.filters {
            for value in values {
                params.push((key.as_str().to_owned(), value.clone()));
            }
        }
        if let Some(search) = &self.search {
            params.push(("search".to_owned(), search.clone()));
        }
        if let Some(order) = &self.order {
            params.push(("sort_by".to_owned(), order.column.as_str().to_owned()));
            params.push(("order".to_owned(), order.direction.as_str().to_owned()));
        }
        params.push(("from_idx".to_owned(), self.offset().to_string()));
        params.push(("limit".to_owned(), self.limit.to_string()));
        params
    }
}
