//! Asynchronous fetching of list data.
//!
//! This module contains:
//! - The `Source` boundary every list endpoint implements
//! - Bindings tracking loading, result and error per list
//! - The invalidation bus used by mutations to refresh bindings
//! - A cancellable debouncer for free-text inputs

mod binding;
mod debounce;
mod invalidation;

pub use binding::{Binding, BindingHandle, BindingOptions, FetchState};
pub use debounce::Debouncer;
pub use invalidation::{InvalidationBus, Subscription};

use crate::carbure::CarbureError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Asynchronous read of one class of list data.
///
#[async_trait]
pub trait Source: Send + Sync + 'static {
    type Query: Clone + PartialEq + Debug + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    async fn fetch(&self, query: Self::Query) -> Result<Self::Output, CarbureError>;
}
