use super::BALANCES;
use crate::carbure::{Balance, Carbure, Endpoint};
use crate::query::{ListStore, QueryContext, StoreConfig};
use crate::screen::{ListScreen, ScreenConfig, Services};
use std::sync::Arc;

crate::query_keys! {
    /// Filters of the balances list.
    pub enum BalanceFilter {
        Sector => "sector",
        Biofuel => "biofuel",
        CustomsCategory => "customs_category",
    }
}

crate::query_keys! {
    pub enum BalanceColumn {
        Sector => "sector",
        Biofuel => "biofuel",
        AvailableBalance => "available_balance",
    }
}

pub const PATH: &str = "/api/tiruert/operations/balance/";

pub type BalancesScreen =
    ListScreen<BalanceFilter, BalanceColumn, Endpoint<BalanceFilter, BalanceColumn, Balance>>;

/// Changing the sort keeps the current page.
///
pub fn store_config() -> StoreConfig {
    StoreConfig {
        first_page: 0,
        reset_page_on_order: false,
    }
}

impl BalancesScreen {
    /// Mount the balances list of the entity in `context`.
    ///
    pub fn open(
        api: Arc<Carbure>,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
    ) -> Self {
        ListScreen::new(
            Endpoint::new(api, PATH),
            BALANCES,
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
        init: impl FnOnce(&mut ListStore<BalanceFilter, BalanceColumn>) -> Result<(), E>,
    ) -> Result<Self, E> {
        ListScreen::try_new(
            Endpoint::new(api, PATH),
            BALANCES,
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
