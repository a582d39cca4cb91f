//! Binding of a list query to its asynchronous fetch state.
//!
//! A binding issues a fetch whenever it is given a query that differs from
//! the previous one, or when its cache key is invalidated. Every issued fetch
//! carries a sequence number; only the resolution of the latest one may
//! write the state, so a slow early response never overwrites a fast later
//! one. Once the binding is dropped, late resolutions are ignored.

use super::invalidation::{InvalidationBus, Subscription};
use super::Source;
use crate::carbure::CarbureError;
use log::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Loading, result and error of a binding.
///
#[derive(Debug)]
pub struct FetchState<T> {
    pub loading: bool,
    pub result: Option<T>,
    pub error: Option<Arc<CarbureError>>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState {
            loading: false,
            result: None,
            error: None,
        }
    }
}

impl<T: Clone> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        FetchState {
            loading: self.loading,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Behaviour of a binding while a fetch is in flight.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindingOptions {
    /// Keep showing the previous result until the new one arrives.
    pub keep_previous: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        BindingOptions {
            keep_previous: true,
        }
    }
}

struct Inner<S: Source> {
    source: S,
    key: String,
    options: BindingOptions,
    latest: AtomicU64,
    alive: AtomicBool,
    query: Mutex<Option<S::Query>>,
    state: watch::Sender<FetchState<S::Output>>,
}

impl<S: Source> Inner<S> {
    fn bind(self: &Arc<Self>, query: S::Query) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        {
            let mut current = self.query.lock().unwrap_or_else(PoisonError::into_inner);
            if current.as_ref() == Some(&query) {
                return false;
            }
            *current = Some(query.clone());
        }
        self.issue(query);
        true
    }

    fn refetch(self: &Arc<Self>) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        let query = self
            .query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match query {
            Some(query) => {
                self.issue(query);
                true
            }
            None => false,
        }
    }

    fn issue(self: &Arc<Self>, query: S::Query) {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
            state.loading = true;
            if !self.options.keep_previous {
                state.result = None;
            }
        });
        debug!("Fetching '{}' #{} with {:?}", self.key, seq, query);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.source.fetch(query).await;
            inner.resolve(seq, outcome);
        });
    }

    fn resolve(&self, seq: u64, outcome: Result<S::Output, CarbureError>) {
        if !self.alive.load(Ordering::Acquire) {
            debug!("Ignoring '{}' #{} resolved after unmount", self.key, seq);
            return;
        }
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::Acquire) != seq {
                return false;
            }
            state.loading = false;
            match outcome {
                Ok(output) => {
                    state.result = Some(output);
                    state.error = None;
                }
                Err(e) => {
                    warn!("Fetching '{}' failed: {}", self.key, e);
                    state.error = Some(Arc::new(e));
                }
            }
            true
        });
        if !applied {
            debug!("Discarding stale response for '{}' #{}", self.key, seq);
        }
    }
}

/// Fetch state of one list bound to a source.
///
/// Dropping the binding unmounts it: it deregisters from the invalidation
/// bus and ignores every response still in flight.
pub struct Binding<S: Source> {
    inner: Arc<Inner<S>>,
    listener: JoinHandle<()>,
    _subscription: Subscription,
}

impl<S: Source> Binding<S> {
    /// Create a binding registered under `key` on the bus. Nothing is fetched
    /// until the first [`Binding::bind`]. Requires a tokio runtime.
    ///
    pub fn new(source: S, key: &str, bus: &InvalidationBus, options: BindingOptions) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        let inner = Arc::new(Inner {
            source,
            key: key.to_owned(),
            options,
            latest: AtomicU64::new(0),
            alive: AtomicBool::new(true),
            query: Mutex::new(None),
            state,
        });

        let subscription = bus.register(key);
        let signal = subscription.signal();
        let weak: Weak<Inner<S>> = Arc::downgrade(&inner);
        let listener = tokio::spawn(async move {
            loop {
                signal.notified().await;
                match weak.upgrade() {
                    Some(inner) => {
                        info!("Cache key '{}' invalidated, refreshing", inner.key);
                        inner.refetch();
                    }
                    None => break,
                }
            }
        });

        Binding {
            inner,
            listener,
            _subscription: subscription,
        }
    }

    /// Bind a query, fetching if it differs from the current one. Returns
    /// whether a fetch was issued.
    ///
    pub fn bind(&self, query: S::Query) -> bool {
        self.inner.bind(query)
    }

    /// Fetch the current query again.
    ///
    pub fn refetch(&self) -> bool {
        self.inner.refetch()
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn query(&self) -> Option<S::Query> {
        self.inner
            .query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the current state.
    ///
    pub fn state(&self) -> FetchState<S::Output> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    ///
    pub fn subscribe(&self) -> watch::Receiver<FetchState<S::Output>> {
        self.inner.state.subscribe()
    }

    /// Cloneable handle for callers that outlive a borrow of the binding,
    /// such as debounced inputs.
    ///
    pub fn handle(&self) -> BindingHandle<S> {
        BindingHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<S: Source> Drop for Binding<S> {
    fn drop(&mut self) {
        self.inner.alive.store(false, Ordering::Release);
        self.listener.abort();
        debug!("Unmounted binding for '{}'", self.inner.key);
    }
}

/// Weak handle to a binding. Calls become no-ops once the binding is gone.
///
pub struct BindingHandle<S: Source> {
    inner: Weak<Inner<S>>,
}

impl<S: Source> Clone for BindingHandle<S> {
    fn clone(&self) -> Self {
        BindingHandle {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: Source> BindingHandle<S> {
    pub fn bind(&self, query: S::Query) -> bool {
        self.inner
            .upgrade()
            .map_or(false, |inner| inner.bind(query))
    }

    pub fn refetch(&self) -> bool {
        self.inner.upgrade().map_or(false, |inner| inner.refetch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Source answering `"<query>@<call>"` after a delay picked by the
    /// query, failing for queries starting with `fail`.
    struct DelayedSource {
        calls: Arc<AtomicUsize>,
        delay: fn(&str) -> u64,
    }

    impl DelayedSource {
        fn new(delay: fn(&str) -> u64) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                DelayedSource {
                    calls: Arc::clone(&calls),
                    delay,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Source for DelayedSource {
        type Query = String;
        type Output = String;

        async fn fetch(&self, query: String) -> Result<String, CarbureError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(Duration::from_millis((self.delay)(&query))).await;
            if query.starts_with("fail") {
                return Err(CarbureError::ApiError {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(format!("{}@{}", query, call))
        }
    }

    fn fixed(_: &str) -> u64 {
        10
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1_000)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_bind_fetches() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        assert!(!binding.state().loading);

        assert!(binding.bind("q1".into()));
        assert!(binding.state().loading);
        settle().await;

        let state = binding.state();
        assert!(!state.loading);
        assert_eq!(state.result.as_deref(), Some("q1@1"));
        assert!(state.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn equal_query_does_not_refetch() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());

        assert!(binding.bind("q1".into()));
        assert!(!binding.bind("q1".into()));
        settle().await;
        assert!(!binding.bind("q1".into()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(binding.query().as_deref(), Some("q1"));
    }

    #[tokio::test(start_paused = true)]
    async fn last_issued_fetch_wins() {
        fn slow_first(query: &str) -> u64 {
            if query == "q1" {
                100
            } else {
                10
            }
        }
        let (source, calls) = DelayedSource::new(slow_first);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "operations", &bus, BindingOptions::default());

        binding.bind("q1".into());
        binding.bind("q2".into());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = binding.state();
        assert!(!state.loading);
        assert_eq!(state.result.as_deref(), Some("q2@2"));

        settle().await;
        assert_eq!(binding.state().result.as_deref(), Some("q2@2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_loading_until_latest_resolves() {
        fn slow_second(query: &str) -> u64 {
            if query == "q2" {
                100
            } else {
                10
            }
        }
        let (source, _) = DelayedSource::new(slow_second);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "operations", &bus, BindingOptions::default());

        binding.bind("q1".into());
        binding.bind("q2".into());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = binding.state();
        assert!(state.loading);
        assert_eq!(state.result, None);

        settle().await;
        assert_eq!(binding.state().result.as_deref(), Some("q2@2"));
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_previous_result_while_revalidating() {
        let (source, _) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        binding.bind("q1".into());
        settle().await;

        binding.bind("q2".into());
        let state = binding.state();
        assert!(state.loading);
        assert_eq!(state.result.as_deref(), Some("q1@1"));
    }

    #[tokio::test(start_paused = true)]
    async fn opting_out_clears_result_while_loading() {
        let (source, _) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(
            source,
            "balances",
            &bus,
            BindingOptions {
                keep_previous: false,
            },
        );
        binding.bind("q1".into());
        settle().await;

        binding.bind("q2".into());
        let state = binding.state();
        assert!(state.loading);
        assert_eq!(state.result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_captured() {
        let (source, _) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "tickets", &bus, BindingOptions::default());
        binding.bind("ok".into());
        settle().await;

        binding.bind("fail".into());
        settle().await;
        let state = binding.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_ref().and_then(|e| e.status()), Some(500));
        assert_eq!(state.result.as_deref(), Some("ok@1"));

        binding.bind("ok again".into());
        settle().await;
        let state = binding.state();
        assert!(state.error.is_none());
        assert_eq!(state.result.as_deref(), Some("ok again@3"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_refetches_unchanged_query() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        binding.bind("q".into());
        settle().await;
        assert_eq!(binding.state().result.as_deref(), Some("q@1"));

        let mut changes = binding.subscribe();
        changes.borrow_and_update();
        assert_eq!(bus.invalidate(&["balances"]), 1);

        changes.changed().await.unwrap();
        {
            let state = changes.borrow_and_update();
            assert!(state.loading);
            assert_eq!(state.result.as_deref(), Some("q@1"));
        }

        changes.changed().await.unwrap();
        let state = changes.borrow_and_update().clone();
        assert!(!state.loading);
        assert_eq!(state.result.as_deref(), Some("q@2"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(binding.query().as_deref(), Some("q"));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_of_other_key_is_ignored() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        binding.bind("q".into());
        settle().await;

        assert_eq!(bus.invalidate(&["tickets"]), 0);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_before_first_bind_fetches_nothing() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        bus.invalidate(&["balances"]);
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(binding.state().result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_deregisters_and_ignores_late_responses() {
        let (source, calls) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        let changes = binding.subscribe();
        let handle = binding.handle();
        binding.bind("q".into());
        assert_eq!(bus.subscribers("balances"), 1);

        drop(binding);
        assert_eq!(bus.subscribers("balances"), 0);
        assert!(!handle.bind("other".into()));
        assert!(!handle.refetch());
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(changes.borrow().result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_binds_while_binding_lives() {
        let (source, _) = DelayedSource::new(fixed);
        let bus = InvalidationBus::new();
        let binding = Binding::new(source, "balances", &bus, BindingOptions::default());
        let handle = binding.handle();
        assert!(handle.bind("from handle".into()));
        settle().await;
        assert_eq!(binding.state().result.as_deref(), Some("from handle@1"));
        assert!(handle.refetch());
    }
}
