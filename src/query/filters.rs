//! Filter selections and the normalization helpers shared by the store and
//! the query builder.

use super::QueryKey;
use std::collections::{BTreeMap, BTreeSet};

/// Selected values per filter key. A missing or empty key means the screen
/// does not constrain that dimension.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSelection<F: QueryKey> {
    values: BTreeMap<F, BTreeSet<String>>,
}

impl<F: QueryKey> Default for FilterSelection<F> {
    fn default() -> Self {
        FilterSelection {
            values: BTreeMap::new(),
        }
    }
}

impl<F: QueryKey> FilterSelection<F> {
    /// Return an empty selection.
    ///
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`FilterSelection::set`].
    ///
    pub fn with<I, V>(mut self, key: F, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.set(key, values);
        self
    }

    /// Replace the values selected for a key. An empty iterator keeps the key
    /// with no values, which the query builder treats as "no constraint".
    ///
    pub fn set<I, V>(&mut self, key: F, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values
            .insert(key, values.into_iter().map(Into::into).collect());
    }

    /// Add a single value to a key.
    ///
    pub fn insert(&mut self, key: F, value: impl Into<String>) {
        self.values.entry(key).or_default().insert(value.into());
    }

    /// Drop a key entirely.
    ///
    pub fn remove(&mut self, key: F) -> Option<BTreeSet<String>> {
        self.values.remove(&key)
    }

    pub fn get(&self, key: F) -> Option<&BTreeSet<String>> {
        self.values.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &BTreeSet<String>)> {
        self.values.iter().map(|(key, values)| (*key, values))
    }

    /// True when no key constrains anything.
    ///
    pub fn is_empty(&self) -> bool {
        self.values.values().all(BTreeSet::is_empty)
    }

    /// Return the selection with blank values and empty keys removed.
    ///
    pub fn normalized(&self) -> BTreeMap<F, BTreeSet<String>> {
        self.values
            .iter()
            .filter_map(|(key, values)| {
                let values: BTreeSet<String> = values
                    .iter()
                    .filter_map(|value| normalize_value(value))
                    .collect();
                (!values.is_empty()).then_some((*key, values))
            })
            .collect()
    }
}

impl<F: QueryKey, V: Into<String>> FromIterator<(F, V)> for FilterSelection<F> {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut selection = FilterSelection::new();
        for (key, value) in iter {
            selection.insert(key, value);
        }
        selection
    }
}

/// Trim a filter value, returning `None` for blank input.
///
pub fn normalize_value(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// An empty or whitespace-only search term means "no search".
///
pub fn normalize_search(term: Option<String>) -> Option<String> {
    term.and_then(|term| normalize_value(&term))
}
