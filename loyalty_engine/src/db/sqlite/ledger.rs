use chrono::Utc;
use log::trace;
use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::{
    db::{
        sqlite::SqliteDatabaseError,
        traits::{DebitExpenseResult, InsertIncomeResult},
    },
    db_types::{Balance, LedgerEntry, Order, OrderNumber, OrderStatusType},
};

/// Appends an income row for the order. The partial unique index on `order_number` rejects a second income row for
/// the same order, which is reported as [`InsertIncomeResult::AlreadyExists`].
pub async fn credit_income(
    user_id: &str,
    number: &OrderNumber,
    sum: Points,
    conn: &mut SqliteConnection,
) -> Result<InsertIncomeResult, SqliteDatabaseError> {
    let result = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO transactions (user_id, order_number, income, sum, created_at)
            VALUES (?, ?, 1, ?, ?)
            RETURNING id;
        "#,
    )
    .bind(user_id)
    .bind(number)
    .bind(sum)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(id) => Ok(InsertIncomeResult::Inserted(id)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(InsertIncomeResult::AlreadyExists),
        Err(e) => Err(SqliteDatabaseError::from(e)),
    }
}

/// Appends an expense row, provided the user's balance covers it. The balance check is part of the `INSERT`
/// statement so that two concurrent withdrawals cannot overdraw the account.
pub async fn debit_expense(
    user_id: &str,
    number: &OrderNumber,
    sum: Points,
    conn: &mut SqliteConnection,
) -> Result<DebitExpenseResult, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO transactions (user_id, order_number, income, sum, created_at)
            SELECT ?, ?, 0, ?, ?
            WHERE (
                SELECT COALESCE(SUM(CASE WHEN income THEN sum ELSE -sum END), 0)
                FROM transactions WHERE user_id = ?
            ) >= ?
            RETURNING id;
        "#,
    )
    .bind(user_id)
    .bind(number)
    .bind(sum)
    .bind(Utc::now())
    .bind(user_id)
    .bind(sum)
    .fetch_optional(&mut *conn)
    .await?;
    match id {
        Some(id) => Ok(DebitExpenseResult::Debited(id)),
        None => {
            let entries = fetch_transactions(user_id, conn).await?;
            let balance = Balance::from_entries(&entries);
            trace!("🗃️ Debit of {sum} for {user_id} refused. Balance is {}", balance.current);
            Ok(DebitExpenseResult::InsufficientFunds(balance.current))
        },
    }
}

pub async fn fetch_transactions(
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<LedgerEntry>, SqliteDatabaseError> {
    let entries = sqlx::query_as(
        r#"
            SELECT id, user_id, order_number, income, sum, created_at
            FROM transactions
            WHERE user_id = ?
            ORDER BY id ASC;
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

/// Processed orders that have no income row, oldest first.
pub async fn fetch_uncredited_orders(
    limit: u32,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let orders = sqlx::query_as(
        r#"
            SELECT o.id, o.number, o.user_id, o.status, o.accrual, o.created_at, o.updated_at
            FROM orders o
            WHERE o.status = ?
              AND NOT EXISTS (SELECT 1 FROM transactions t WHERE t.order_number = o.number AND t.income = 1)
            ORDER BY o.id ASC
            LIMIT ?;
        "#,
    )
    .bind(OrderStatusType::Processed)
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?;
    Ok(orders)
}
