//! Loyalty Engine
//!
//! The loyalty engine is the core of the loyalty points backend. Users register the orders they have placed, an
//! external accrual service calculates the reward points for each order in its own time, and the engine keeps the
//! two in sync: it polls the accrual service for every unfinished order, records the outcome and credits the points
//! to the user.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should never need to access
//!    the database directly. Instead, use the public API provided by the engine. The exception is the data types used
//!    in the database. These are defined in the `db_types` module and are public.
//! 2. Accrual synchronization ([`mod@accrual`]). The job reader, check workers and update pipeline that keep order
//!    statuses up to date, along with the HTTP client for the accrual service.
//! 3. The public API ([`mod@lpe_api`]). [`OrderService`] registers and lists orders and owns the accrual
//!    synchronizer. [`LedgerApi`] reports balances and handles withdrawals.
//!
//! The engine also publishes events when an order is credited or turns out to be invalid. Hook into them with
//! [`events::EventHooks`].
mod db;

pub mod accrual;
pub mod db_types;
pub mod events;
mod lpe_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use accrual::{AccrualClient, AccrualSyncConfig, HttpAccrualClient};
#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{
    DebitExpenseResult,
    InsertIncomeResult,
    InsertOrderResult,
    LedgerManagement,
    LoyaltyDatabase,
    OrderManagement,
    OrderQueryFilter,
    UpdateOrderResult,
};
pub use lpe_api::{
    errors::{LedgerApiError, OrderApiError},
    ledger_api::LedgerApi,
    order_objects,
    order_service::OrderService,
};
