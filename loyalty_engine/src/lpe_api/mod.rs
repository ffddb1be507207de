//! # Loyalty engine public API
//!
//! The `lpe_api` module exposes the programmatic API of the loyalty engine to the HTTP layer.
//!
//! * [`order_service`] registers orders, lists them, and owns the accrual synchronizer that keeps their status up to
//!   date.
//! * [`ledger_api`] reports balances and handles withdrawals.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits required by the API.
//!
//! ```rust,ignore
//! use loyalty_engine::{AccrualSyncConfig, HttpAccrualClient, OrderService, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let client = HttpAccrualClient::new("http://localhost:8080", timeout, pause)?;
//! let service = OrderService::new(db, client, AccrualSyncConfig::default(), EventProducers::default());
//! service.start(&shutdown)?;
//! service.register("alice", "79927398713").await?;
//! let orders = service.list("alice").await?;
//! ```
pub mod errors;
pub mod ledger_api;
pub mod order_objects;
pub mod order_service;
