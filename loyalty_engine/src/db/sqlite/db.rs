use std::fmt::Debug;

use log::*;
use loyalty_common::Points;
use sqlx::{migrate, SqlitePool};

use super::{db_url, ledger, new_pool, orders, SqliteDatabaseError};
use crate::{
    db::traits::{
        DebitExpenseResult,
        InsertIncomeResult,
        InsertOrderResult,
        LedgerManagement,
        LoyaltyDatabase,
        OrderManagement,
        OrderQueryFilter,
        UpdateOrderResult,
    },
    db_types::{LedgerEntry, NewOrder, Order, OrderNumber, OrderStatusType},
};

const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<InsertOrderResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let number = order.number.clone();
        let result = orders::idempotent_insert(order, &mut conn).await?;
        if let InsertOrderResult::Inserted(id) = &result {
            debug!("🗃️ Order {number} has been saved in the DB with id {id}");
        }
        Ok(result)
    }

    async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<UpdateOrderResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(number, status, accrual, &mut conn).await
    }

    async fn fetch_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(filter, &mut conn).await
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(number, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn credit_income(
        &self,
        user_id: &str,
        number: &OrderNumber,
        sum: Points,
    ) -> Result<InsertIncomeResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let result = ledger::credit_income(user_id, number, sum, &mut conn).await?;
        match result {
            InsertIncomeResult::Inserted(id) => debug!("🗃️ Credited {sum} to {user_id} for order {number} (entry {id})"),
            InsertIncomeResult::AlreadyExists => debug!("🗃️ Order {number} has already been credited"),
        }
        Ok(result)
    }

    async fn debit_expense(
        &self,
        user_id: &str,
        number: &OrderNumber,
        sum: Points,
    ) -> Result<DebitExpenseResult, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ledger::debit_expense(user_id, number, sum, &mut conn).await
    }

    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<LedgerEntry>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_transactions(user_id, &mut conn).await
    }

    async fn fetch_uncredited_orders(&self, limit: u32) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_uncredited_orders(limit, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `LOYALTY_DATABASE_URL`
    pub async fn new() -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
