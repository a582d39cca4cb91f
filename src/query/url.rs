//! Mirror of filters and search in a navigable location.
//!
//! One query-string entry per selected filter value (`?biofuel=ETH&biofuel=EMHV`)
//! plus `search`. Entries the screen does not own are kept as they are.

use super::filters::{normalize_search, normalize_value, FilterSelection};
use super::QueryKey;
use reqwest::Url;

/// Query-string name of the free-text search.
pub const SEARCH_PARAM: &str = "search";

/// Read the filters and search encoded in a location. Unknown keys are
/// ignored.
///
pub fn read_location<F: QueryKey>(location: &Url) -> (FilterSelection<F>, Option<String>) {
    let mut filters = FilterSelection::new();
    let mut search = None;
    for (name, value) in location.query_pairs() {
        if name == SEARCH_PARAM {
            search = normalize_search(Some(value.into_owned()));
        } else if let Some(key) = F::parse(&name) {
            if let Some(value) = normalize_value(&value) {
                filters.insert(key, value);
            }
        }
    }
    (filters, search)
}

/// Rewrite the filter and search entries of a location.
///
pub fn write_location<F: QueryKey>(
    location: &mut Url,
    filters: &FilterSelection<F>,
    search: Option<&str>,
) {
    let mut pairs: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(name, _)| name != SEARCH_PARAM && F::parse(name).is_none())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    for (key, values) in filters.normalized() {
        pairs.extend(values.into_iter().map(|value| (key.as_str().to_owned(), value)));
    }
    if let Some(search) = search {
        pairs.push((SEARCH_PARAM.to_owned(), search.to_owned()));
    }

    if pairs.is_empty() {
        location.set_query(None);
    } else {
        location.query_pairs_mut().clear().extend_pairs(pairs);
    }
}
