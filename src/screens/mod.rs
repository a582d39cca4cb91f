//! The list screens of the application.
//!
//! Each screen declares its closed filter and column enumerations, the path
//! of its list endpoint and the cache key mutations invalidate it with.

mod balances;
mod operations;
mod tickets;

pub use balances::{BalanceColumn, BalanceFilter, BalancesScreen};
pub use operations::{OperationColumn, OperationFilter, OperationsScreen};
pub use tickets::{TicketColumn, TicketFilter, TicketsScreen};

/// Cache key of the balances list.
pub const BALANCES: &str = "balances";
/// Cache key of the operations list.
pub const OPERATIONS: &str = "operations";
/// Cache key of the SAF tickets list.
pub const TICKETS: &str = "tickets";
