use std::future::Future;

use loyalty_common::Points;

use crate::{
    db::traits::{DebitExpenseResult, InsertIncomeResult, LoyaltyDatabase},
    db_types::{LedgerEntry, Order, OrderNumber},
};

/// The points ledger. Balances are never stored; they are derived from the ledger entries.
pub trait LedgerManagement: LoyaltyDatabase {
    /// Credits `sum` to the user for a processed order. Each order is credited at most once; a second call for the
    /// same order number returns [`InsertIncomeResult::AlreadyExists`] and writes nothing.
    fn credit_income(
        &self,
        user_id: &str,
        number: &OrderNumber,
        sum: Points,
    ) -> impl Future<Output = Result<InsertIncomeResult, Self::Error>> + Send;

    /// Debits `sum` from the user. The balance check and the write must be atomic. If the balance does not cover the
    /// sum, nothing is written and [`DebitExpenseResult::InsufficientFunds`] carries the current balance.
    fn debit_expense(
        &self,
        user_id: &str,
        number: &OrderNumber,
        sum: Points,
    ) -> impl Future<Output = Result<DebitExpenseResult, Self::Error>> + Send;

    /// All ledger entries for the user, oldest first.
    fn fetch_transactions(&self, user_id: &str) -> impl Future<Output = Result<Vec<LedgerEntry>, Self::Error>> + Send;

    /// Up to `limit` orders that are `Processed` but have no income entry, oldest first. Such an order was interrupted
    /// between its status write and its credit.
    fn fetch_uncredited_orders(&self, limit: u32) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send;
}
