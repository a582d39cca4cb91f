use super::TICKETS;
use crate::carbure::{Carbure, Endpoint, Ticket};
use crate::query::{ListStore, QueryContext, StoreConfig};
use crate::screen::{ListScreen, ScreenConfig, Services};
use std::sync::Arc;

crate::query_keys! {
    /// Filters of the SAF tickets list.
    pub enum TicketFilter {
        Period => "period",
        Feedstock => "feedstock",
        Supplier => "supplier",
        Client => "client",
        CountryOfOrigin => "country_of_origin",
    }
}

crate::query_keys! {
    pub enum TicketColumn {
        CreatedAt => "created_at",
        Volume => "volume",
        Period => "period",
    }
}

pub const PATH: &str = "/api/saf/tickets/";

pub type TicketsScreen =
    ListScreen<TicketFilter, TicketColumn, Endpoint<TicketFilter, TicketColumn, Ticket>>;

/// Changing the sort sends the user back to the first page.
///
pub fn store_config() -> StoreConfig {
    StoreConfig {
        first_page: 0,
        reset_page_on_order: true,
    }
}

impl TicketsScreen {
    pub fn open(
        api: Arc<Carbure>,
        context: QueryContext,
        services: &Services,
        config: ScreenConfig,
    ) -> Self {
        ListScreen::new(
            Endpoint::new(api, PATH),
            TICKETS,
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
        init: impl FnOnce(&mut ListStore<TicketFilter, TicketColumn>) -> Result<(), E>,
    ) -> Result<Self, E> {
        ListScreen::try_new(
            Endpoint::new(api, PATH),
            TICKETS,
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
