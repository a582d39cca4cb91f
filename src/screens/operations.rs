use super::OPERATIONS;
use crate::carbure::{Carbure, Endpoint, Operation};
use crate::query::{ListStore, QueryContext, StoreConfig};
use crate::screen::{ListScreen, ScreenConfig, Services};
use std::sync::Arc;

crate::query_keys! {
    /// Filters of the operations list.
    pub enum OperationFilter {
        Sector => "sector",
        Biofuel => "biofuel",
        CustomsCategory => "customs_category",
        Type => "type",
        Status => "status",
        FromTo => "from_to",
        Period => "period",
    }
}

crate::query_keys! {
    pub enum OperationColumn {
        CreatedAt => "created_at",
        Quantity => "quantity",
        Biofuel => "biofuel",
    }
}

pub const PATH: &str = "/api/tiruert/operations/";

pub type OperationsScreen = ListScreen<
    OperationFilter,
    OperationColumn,
    Endpoint<OperationFilter, OperationColumn, Operation>,
>;

pub fn store_config() -> StoreConfig {
    StoreConfig {
        first_page: 0,
        reset_page_on_order: false,
    }
}

impl OperationsScreen {
    /// Mount the operations list of the entity in `context`. The context
    /// status narrows the list to one tab (pending, accepted...).
    ///
    pub fn open(
        api: Arc<Carbure>,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
    ) -> Self {
        ListScreen::new(
            Endpoint::new(api, PATH),
            OPERATIONS,
            context,
            services,
            ScreenConfig {
                store: store_config(),
                ..config
            },
        )
    }

    /// Mount the list with its store prepared by `init`, so the first fetch
    /// already reflects it.
    ///
    pub fn open_with<E>(
        api: Arc<Carbure>,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
        init: impl FnOnce(&mut ListStore<OperationFilter, OperationColumn>) -> Result<(), E>,
    ) -> Result<Self, E> {
        ListScreen::try_new(
            Endpoint::new(api, PATH),
            OPERATIONS,
            context,
            services,
            ScreenConfig {
                store: store_config(),
                ..config
            },
            init,
        )
    }
}
