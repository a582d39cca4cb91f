use crate::carbure::{Carbure, Endpoint, Page};
use crate::config::Config;
use crate::fetch::InvalidationBus;
use crate::preferences::FilePreferences;
use crate::query::{FilterSelection, ListStore, QueryContext, QueryError, QueryKey, SortOrder};
use crate::screen::{ListScreen, ScreenConfig, Services};
use crate::screens::{BalancesScreen, OperationsScreen, TicketsScreen};
use anyhow::{anyhow, Result};
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::Arc;

/// List screens reachable from the command line.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenKind {
    Balances,
    Operations,
    Tickets,
}

impl ScreenKind {
    pub const NAMES: &'static [&'static str] = &["balances", "operations", "tickets"];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "balances" => Some(ScreenKind::Balances),
            "operations" => Some(ScreenKind::Operations),
            "tickets" => Some(ScreenKind::Tickets),
            _ => None,
        }
    }
}

/// State changes requested on the command line, applied in order.
///
#[derive(Clone, Debug, Default)]
pub struct ListRequest {
    pub entity_id: Option<u64>,
    pub year: Option<i32>,
    pub filters: Vec<(String, String)>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Print the options of this filter instead of the rows.
    pub options: Option<String>,
}

/// Oversees one listing: mounts the screen prepared with the request and
/// prints the resulting page.
///
pub struct App {
    api: Arc<Carbure>,
    services: Services,
    config: Config,
}

impl App {
    /// Start a new application according to the given configuration. Returns
    /// the result of the listing.
    ///
    pub async fn start(config: Config, kind: ScreenKind, request: ListRequest) -> Result<()> {
        info!("Starting application...");
        let api = Arc::new(Carbure::new(&config.base_url, config.access_token.as_deref())?);
        let preferences = FilePreferences::open(config.preferences_path()?)?;
        let app = App {
            api,
            services: Services::new(InvalidationBus::new(), Arc::new(preferences)),
            config,
        };

        let entity_id = match request.entity_id {
            Some(id) => id,
            None => app.config.entity_id()?,
        };
        let mut context = QueryContext::new(entity_id);
        if let Some(year) = request.year {
            context = context.year(year);
        }
        let screen_config = ScreenConfig {
            search_debounce: app.config.search_debounce(),
            ..ScreenConfig::default()
        };

        match kind {
            ScreenKind::Balances => {
                let screen = BalancesScreen::open_with(
                    app.api(),
                    context,
                    &app.services,
                    screen_config,
                    |store| apply(store, &request),
                )?;
                app.list(screen, &request).await?
            }
            ScreenKind::Operations => {
                let screen = OperationsScreen::open_with(
                    app.api(),
                    context,
                    &app.services,
                    screen_config,
                    |store| apply(store, &request),
                )?;
                app.list(screen, &request).await?
            }
            ScreenKind::Tickets => {
                let screen = TicketsScreen::open_with(
                    app.api(),
                    context,
                    &app.services,
                    screen_config,
                    |store| apply(store, &request),
                )?;
                app.list(screen, &request).await?
            }
        }

        info!("Exiting application...");
        Ok(())
    }

    fn api(&self) -> Arc<Carbure> {
        Arc::clone(&self.api)
    }

    async fn list<F, C, T>(
        &self,
        screen: ListScreen<F, C, Endpoint<F, C, T>>,
        request: &ListRequest,
    ) -> Result<()>
    where
        F: QueryKey,
        C: QueryKey,
        T: DeserializeOwned + Serialize + Clone + Send + Sync + 'static,
    {
        if let Some(name) = &request.options {
            let key = F::parse(name).ok_or_else(|| QueryError::UnknownFilter(name.clone()))?;
            let options = self
                .api
                .filter_options(screen.source().path(), key, &screen.query())
                .await;
            let mut stdout = io::stdout().lock();
            for option in options {
                writeln!(stdout, "{}", serde_json::to_string(&option)?)?;
            }
            return Ok(());
        }

        let mut states = screen.subscribe();
        let state = states.wait_for(|state| !state.loading).await?.clone();
        if let Some(error) = state.error {
            return Err(anyhow!("Failed to list '{}': {}", screen.key(), error));
        }
        let page = state.result.unwrap_or(Page {
            results: vec![],
            count: 0,
        });

        let mut stdout = io::stdout().lock();
        for row in &page.results {
            writeln!(stdout, "{}", serde_json::to_string(row)?)?;
        }
        let limit = screen.limit();
        writeln!(
            io::stderr(),
            "{} row(s) on page {} of {}, {} in total",
            page.results.len(),
            screen.page() + 1,
            page.page_count(limit).max(1),
            page.count
        )?;
        Ok(())
    }
}

/// Apply the request through the store actions. Page comes last since every
/// other change may send the store back to its first page.
///
fn apply<F: QueryKey, C: QueryKey>(
    store: &mut ListStore<F, C>,
    request: &ListRequest,
) -> Result<(), QueryError> {
    if !request.filters.is_empty() {
        store.set_filters(parse_filters(&request.filters)?);
    }
    if request.search.is_some() {
        store.set_search(request.search.clone());
    }
    if let Some(name) = &request.sort {
        let column = C::parse(name).ok_or_else(|| QueryError::UnknownColumn(name.clone()))?;
        store.set_order(Some(if request.descending {
            SortOrder::descending(column)
        } else {
            SortOrder::ascending(column)
        }));
    }
    if request.limit.is_some() {
        store.set_limit(request.limit)?;
    }
    if request.page.is_some() {
        store.set_page(request.page);
    }
    Ok(())
}

/// Group `key=value` arguments into a selection, rejecting unknown keys.
///
pub fn parse_filters<F: QueryKey>(pairs: &[(String, String)]) -> Result<FilterSelection<F>, QueryError> {
    let mut filters = FilterSelection::new();
    for (name, value) in pairs {
        let key = F::parse(name).ok_or_else(|| QueryError::UnknownFilter(name.clone()))?;
        filters.insert(key, value.clone());
    }
    Ok(filters)
}

/// Split a `key=value` argument.
///
pub fn split_filter(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}
