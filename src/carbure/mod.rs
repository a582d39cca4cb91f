mod client;
mod error;
mod mutation;
mod resource;

pub use error::CarbureError;
pub use mutation::{Mutation, MutationHandler, OperationDraft, OperationKind};
pub use resource::*;

use crate::fetch::Source;
use crate::query::{ListQuery, QueryKey};
use async_trait::async_trait;
use client::Client;
use log::*;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Default CarbuRe instance.
pub const DEFAULT_BASE_URL: &str = "https://carbure.beta.gouv.fr";

/// Responsible for asynchronous interaction with the CarbuRe API including
/// transformation of response data into explicitly-defined types.
///
pub struct Carbure {
    client: Client,
}

impl Carbure {
    /// Returns a new instance for the given base URL and optional token.
    ///
    pub fn new(base_url: &str, access_token: Option<&str>) -> Result<Carbure, CarbureError> {
        debug!("Initializing CarbuRe client for {}...", base_url);
        Ok(Carbure {
            client: Client::new(access_token, base_url)?,
        })
    }

    /// Returns one page of a list endpoint for the given query.
    ///
    pub async fn list<F, C, T>(
        &self,
        path: &str,
        query: &ListQuery<F, C>,
    ) -> Result<Page<T>, CarbureError>
    where
        F: QueryKey,
        C: QueryKey,
        T: DeserializeOwned,
    {
        debug!(
            "Requesting {} for entity {} (offset {}, limit {})...",
            path,
            query.context.entity_id,
            query.offset(),
            query.limit
        );
        let page: Page<T> = self.client.get(path, &query.to_params()).await?;
        debug!("Retrieved {} of {} rows from {}", page.results.len(), page.count, path);
        Ok(page)
    }

    /// Returns the values a filter can take given every other active filter.
    /// Failures are logged and yield no options.
    ///
    pub async fn filter_options<F: QueryKey, C: QueryKey>(
        &self,
        path: &str,
        key: F,
        query: &ListQuery<F, C>,
    ) -> Vec<FilterOption> {
        let mut params = query.without_filter(key).to_params();
        params.push(("filter".to_owned(), key.as_str().to_owned()));
        let path = format!("{}/filters/", path.trim_end_matches('/'));
        match self.client.get::<Vec<FilterOption>>(&path, &params).await {
            Ok(options) => options,
            Err(e) => {
                warn!("Failed to fetch options for filter '{}': {}", key.as_str(), e);
                vec![]
            }
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}

/// One list endpoint of the API, usable as a binding source.
///
pub struct Endpoint<F, C, T> {
    api: Arc<Carbure>,
    path: &'static str,
    _marker: PhantomData<fn() -> (F, C, T)>,
}

impl<F, C, T> Endpoint<F, C, T> {
    pub fn new(api: Arc<Carbure>, path: &'static str) -> Self {
        Endpoint {
            api,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn api(&self) -> &Arc<Carbure> {
        &self.api
    }
}

#[async_trait]
impl<F, C, T> Source for Endpoint<F, C, T>
where
    F: QueryKey,
    C: QueryKey,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Query = ListQuery<F, C>;
    type Output = Page<T>;

    async fn fetch(&self, query: ListQuery<F, C>) -> Result<Page<T>, CarbureError> {
        self.api.list(self.path, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;
    use crate::query::{build_query, FilterSelection, ListStore, QueryContext, SortOrder, StoreConfig};
    use crate::screens::{BalanceColumn, BalanceFilter, OperationColumn, OperationFilter};
    use fake::uuid::UUIDv4;
    use fake::{Fake, Faker};
    use httpmock::MockServer;
    use serde_json::json;
    use uuid::Uuid;

    fn list_query<F: QueryKey, C: QueryKey>(
        filters: FilterSelection<F>,
        order: Option<SortOrder<C>>,
    ) -> ListQuery<F, C> {
        let mut store = ListStore::new(StoreConfig::default(), Arc::new(MemoryPreferences::new()));
        store.set_filters(filters);
        store.set_order(order);
        build_query(&store, &QueryContext::new(9).year(2024))
    }

    #[tokio::test]
    async fn list_balances_success() -> anyhow::Result<()> {
        let token: Uuid = UUIDv4.fake();
        let balances: [Balance; 2] = Faker.fake();

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/tiruert/operations/balance/")
                    .header("Authorization", &format!("Bearer {}", &token))
                    .query_param("entity_id", "9")
                    .query_param("year", "2024")
                    .query_param("sector", "ESSENCE")
                    .query_param("from_idx", "0")
                    .query_param("limit", "10");
                then.status(200).json_body(json!({
                    "count": 12,
                    "results": [balances[0], balances[1]],
                }));
            })
            .await;

        let api = Carbure::new(&server.base_url(), Some(&token.to_string()))?;
        let page: Page<Balance> = api
            .list(
                "/api/tiruert/operations/balance/",
                &list_query::<BalanceFilter, BalanceColumn>(
                    FilterSelection::new().with(BalanceFilter::Sector, ["ESSENCE"]),
                    None,
                ),
            )
            .await?;
        mock.assert_async().await;
        assert_eq!(page.count, 12);
        assert_eq!(page.results, balances.to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn list_sends_order() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/tiruert/operations/")
                    .query_param("sort_by", "quantity")
                    .query_param("order", "desc")
                    .query_param("type", "CESSION")
                    .query_param("type", "EXPORT");
                then.status(200).json_body(json!({ "count": 0, "results": [] }));
            })
            .await;

        let api = Carbure::new(&server.base_url(), None)?;
        let page: Page<Operation> = api
            .list(
                "/api/tiruert/operations/",
                &list_query(
                    FilterSelection::new().with(OperationFilter::Type, ["CESSION", "EXPORT"]),
                    Some(SortOrder::descending(OperationColumn::Quantity)),
                ),
            )
            .await?;
        mock.assert_async().await;
        assert!(page.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_unauthorized() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET").path("/api/saf/tickets/");
                then.status(401).body("Authentication credentials were not provided.");
            })
            .await;

        let api = Carbure::new(&server.base_url(), None).unwrap();
        let result: Result<Page<Ticket>, _> = api
            .list(
                "/api/saf/tickets/",
                &list_query::<BalanceFilter, BalanceColumn>(FilterSelection::new(), None),
            )
            .await;
        mock.assert_async().await;
        match result {
            Err(CarbureError::ApiError { status, message }) => {
                assert_eq!(status, 401);
                assert!(message.contains("credentials"));
            }
            other => panic!("unexpected result: {:?}", other.map(|p| p.count)),
        }
    }

    #[tokio::test]
    async fn list_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tiruert/operations/");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let api = Carbure::new(&server.base_url(), None).unwrap();
        let result: Result<Page<Operation>, _> = api
            .list(
                "/api/tiruert/operations/",
                &list_query::<OperationFilter, OperationColumn>(FilterSelection::new(), None),
            )
            .await;
        assert!(matches!(result, Err(CarbureError::Deserialization(_))));
    }

    #[tokio::test]
    async fn filter_options_drop_their_own_filter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/tiruert/operations/filters/")
                    .query_param("filter", "biofuel")
                    .query_param("sector", "ESSENCE");
                then.status(200).json_body(json!(["ETH", { "value": "ETBE", "label": "ETBE" }]));
            })
            .await;

        let api = Carbure::new(&server.base_url(), None).unwrap();
        let query = list_query::<OperationFilter, OperationColumn>(
            FilterSelection::new()
                .with(OperationFilter::Sector, ["ESSENCE"])
                .with(OperationFilter::Biofuel, ["ETH"]),
            None,
        );
        let options = api
            .filter_options("/api/tiruert/operations/", OperationFilter::Biofuel, &query)
            .await;
        mock.assert_async().await;
        assert_eq!(
            options.iter().map(|o| o.value.as_str()).collect::<Vec<_>>(),
            vec!["ETH", "ETBE"]
        );
    }

    #[tokio::test]
    async fn filter_options_errors_become_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/tiruert/operations/filters/");
                then.status(400).json_body(json!({ "error": "INVALID_FILTER" }));
            })
            .await;

        let api = Carbure::new(&server.base_url(), None).unwrap();
        let options = api
            .filter_options(
                "/api/tiruert/operations/",
                OperationFilter::Status,
                &list_query::<OperationFilter, OperationColumn>(FilterSelection::new(), None),
            )
            .await;
        assert!(options.is_empty());
    }
}
