//! #  Database management and control.
//!
//! This module defines the interface contracts of the loyalty engine database *backends*.
//!
//! * [`LoyaltyDatabase`] is the base trait. It fixes the backend's error type and manages the connection.
//! * [`OrderManagement`] stores orders and enforces the order status lifecycle.
//! * [`LedgerManagement`] appends to and reads from the points ledger.
//!
//! The accrual synchronizer and the public API are generic over backends that implement both
//! `OrderManagement` and `LedgerManagement`.
mod data_objects;
mod ledger_management;
mod loyalty_database;
mod order_management;

pub use data_objects::{
    DebitExpenseResult,
    InsertIncomeResult,
   
    InsertOrderResult,
    OrderQueryFilter,
    UpdateOrderResult,
};
pub use ledger_management::LedgerManagement;
pub use loyalty_database::LoyaltyDatabase;
pub use order_management::OrderManagement;
