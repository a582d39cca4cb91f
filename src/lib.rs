//! Filter, sort and pagination coordination for the CarbuRe list screens.
//!
//! A screen owns a [`query::ListStore`], derives a [`query::ListQuery`] from
//! it and binds that query to an asynchronous [`fetch::Binding`]. Mutations
//! refresh the bindings they affect through the [`fetch::InvalidationBus`].

pub mod app;
pub mod carbure;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logger;
pub mod preferences;
pub mod query;
pub mod screen;
pub mod screens;
