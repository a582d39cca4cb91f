//! Coordination of one list screen.
//!
//! A [`ListScreen`] owns the filter/sort/page store of a screen and keeps its
//! binding in sync with it: every store action rebuilds the query and binds
//! it, so the fetch state always reflects the latest user intent. Free-text
//! search goes through a debouncer so that typing issues a single request.

use crate::carbure::Page;
use crate::fetch::{Binding, BindingOptions, Debouncer, FetchState, InvalidationBus, Source};
use crate::preferences::{MemoryPreferences, PreferenceStore};
use crate::query::{
    build_query, FilterSelection, ListQuery, ListStore, QueryContext, QueryError, QueryKey,
    SortOrder, StoreConfig,
};
use log::*;
use reqwest::Url;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Default quiet period before a search term is applied.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Services shared by every screen of a session.
///
#[derive(Clone)]
pub struct Services {
    pub bus: InvalidationBus,
    pub preferences: Arc<dyn PreferenceStore>,
}

impl Services {
    pub fn new(bus: InvalidationBus, preferences: Arc<dyn PreferenceStore>) -> Self {
        Services { bus, preferences }
    }

    /// Services isolated from any other session, with nothing persisted.
    ///
    pub fn in_memory() -> Self {
        Services::new(InvalidationBus::new(), Arc::new(MemoryPreferences::new()))
    }
}

/// Per-screen settings.
///
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub store: StoreConfig,
    pub binding: BindingOptions,
    pub search_debounce: Duration,
    /// Location to seed the filters from and mirror them into.
    pub location: Option<Url>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        ScreenConfig {
            store: StoreConfig::default(),
            binding: BindingOptions::default(),
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            location: None,
        }
    }
}

/// What a list should display.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing bound yet.
    Idle,
    /// A fetch is in flight; `stale` when previous rows are still shown.
    Loading { stale: bool },
    /// The last fetch failed.
    Failed,
    /// The last fetch returned no rows.
    Empty,
    Ready,
}

/// Outputs that can tell whether they hold any row.
///
pub trait Rows {
    fn row_count(&self) -> usize;
}

impl<T> Rows for Page<T> {
    fn row_count(&self) -> usize {
        self.results.len()
    }
}

impl ListStatus {
    pub fn of<T: Rows>(state: &FetchState<T>) -> Self {
        match (&state.result, state.loading, &state.error) {
            (result, true, _) => ListStatus::Loading {
                stale: result.is_some(),
            },
            (_, false, Some(_)) => ListStatus::Failed,
            (Some(result), false, None) if result.row_count() == 0 => ListStatus::Empty,
            (Some(_), false, None) => ListStatus::Ready,
            (None, false, None) => ListStatus::Idle,
        }
    }
}

type SharedStore<F, C> = Arc<Mutex<ListStore<F, C>>>;

fn lock<F: QueryKey, C: QueryKey>(store: &SharedStore<F, C>) -> MutexGuard<'_, ListStore<F, C>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One mounted list screen. Dropping it unmounts the binding and cancels a
/// pending search.
///
pub struct ListScreen<F, C, S>
where
    F: QueryKey,
    C: QueryKey,
    S: Source<Query = ListQuery<F, C>>,
{
    search: Debouncer<Option<String>>,
    store: SharedStore<F, C>,
    context: QueryContext,
    binding: Binding<S>,
}

impl<F, C, S> ListScreen<F, C, S>
where
    F: QueryKey,
    C: QueryKey,
    S: Source<Query = ListQuery<F, C>>,
{
    /// Mount a screen over `source` and fetch its first page. Requires a
    /// tokio runtime.
    ///
    pub fn new(
        source: S,
        key: &str,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
    ) -> Self {
        match Self::try_new(source, key, context, services, config, |_| {
            Ok::<(), Infallible>(())
        }) {
            Ok(screen) => screen,
            Err(never) => match never {},
        }
    }

    /// Mount a screen whose store is prepared by `init` before anything is
    /// fetched, so the first request already carries the prepared state. If
    /// `init` fails nothing is mounted.
    ///
    pub fn try_new<E>(
        source: S,
        key: &str,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
        init: impl FnOnce(&mut ListStore<F, C>) -> Result<(), E>,
    ) -> Result<Self, E> {
        let mut store = ListStore::new(config.store, Arc::clone(&services.preferences));
        if let Some(location) = config.location {
            store.seed_from_location(location);
        }
        init(&mut store)?;
        let store = Arc::new(Mutex::new(store));
        let binding = Binding::new(source, key, &services.bus, config.binding);

        let search = {
            let store = Arc::clone(&store);
            let context = context.clone();
            let binding = binding.handle();
            Debouncer::new(config.search_debounce, move |term: Option<String>| {
                let mut store = lock(&store);
                store.set_search(term);
                // Bound under the lock so a concurrent action cannot bind in between.
                binding.bind(build_query(&store, &context));
            })
        };

        info!("Mounted list screen '{}'", key);
        let screen = ListScreen {
            search,
            store,
            context,
            binding,
        };
        screen.sync();
        Ok(screen)
    }

    pub fn set_filters(&self, filters: FilterSelection<F>) {
        self.update(|store| store.set_filters(filters));
    }

    /// Apply a search term once typing has paused.
    ///
    pub fn search(&self, term: &str) {
        self.search.schedule(Some(term.to_owned()));
    }

    /// Apply a search term right away, dropping a pending one.
    ///
    pub fn search_now(&self, term: &str) {
        self.search.fire(Some(term.to_owned()));
    }

    pub fn set_order(&self, order: Option<SortOrder<C>>) {
        self.update(|store| store.set_order(order));
    }

    pub fn set_page(&self, page: Option<u32>) {
        self.update(|store| store.set_page(page));
    }

    pub fn set_limit(&self, limit: Option<u32>) -> Result<(), QueryError> {
        self.update(|store| store.set_limit(limit))
    }

    pub fn set_selection<I: IntoIterator<Item = u64>>(&self, ids: I) {
        lock(&self.store).set_selection(ids);
    }

    /// Query matching the current state of the store.
    ///
    pub fn query(&self) -> ListQuery<F, C> {
        build_query(&lock(&self.store), &self.context)
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn filters(&self) -> FilterSelection<F> {
        lock(&self.store).filters().clone()
    }

    pub fn search_term(&self) -> Option<String> {
        lock(&self.store).search().map(str::to_owned)
    }

    pub fn page(&self) -> u32 {
        lock(&self.store).page()
    }

    pub fn limit(&self) -> u32 {
        lock(&self.store).limit()
    }

    pub fn selection(&self) -> BTreeSet<u64> {
        lock(&self.store).selection().clone()
    }

    pub fn location(&self) -> Option<Url> {
        lock(&self.store).location().cloned()
    }

    pub fn state(&self) -> FetchState<S::Output> {
        self.binding.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<S::Output>> {
        self.binding.subscribe()
    }

    /// Fetch the current query again.
    ///
    pub fn refresh(&self) -> bool {
        self.binding.refetch()
    }

    pub fn key(&self) -> &str {
        self.binding.key()
    }

    pub fn source(&self) -> &S {
        self.binding.source()
    }

    /// Run a store action and bind the resulting query. The store stays
    /// locked until the query is bound, so bindings happen in the same order
    /// as the actions.
    ///
    fn update<R>(&self, action: impl FnOnce(&mut ListStore<F, C>) -> R) -> R {
        let mut store = lock(&self.store);
        let outcome = action(&mut store);
        self.binding.bind(build_query(&store, &self.context));
        outcome
    }

    fn sync(&self) {
        self.update(|_| ());
    }
}

impl<F, C, S> ListScreen<F, C, S>
where
    F: QueryKey,
    C: QueryKey,
    S: Source<Query = ListQuery<F, C>>,
    S::Output: Rows,
{
    pub fn status(&self) -> ListStatus {
        ListStatus::of(&self.binding.state())
    }
}
