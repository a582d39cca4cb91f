//! List query state and derivation.
//!
//! This module contains everything between a user interaction and the
//! parameters sent to a list endpoint:
//! - Closed key enumerations (`QueryKey`, `query_keys!`)
//! - Filter selections and normalization helpers
//! - The per-screen state store
//! - The pure query builder
//! - The location query-string mirror

mod builder;
mod error;
mod filters;
pub(crate) mod keys;
mod state;
pub mod url;

pub use builder::{build_query, ListQuery, QueryContext};
pub use error::QueryError;
pub use filters::{normalize_search, normalize_value, FilterSelection};
pub use keys::QueryKey;
pub use state::{Direction, ListStore, SortOrder, StoreConfig};
