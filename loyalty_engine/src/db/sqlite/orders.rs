use chrono::Utc;
use log::{debug, trace};
use loyalty_common::Points;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::{
        sqlite::SqliteDatabaseError,
        traits::{InsertOrderResult, OrderQueryFilter, UpdateOrderResult},
    },
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
};

const ORDER_COLUMNS: &str = "id, number, user_id, status, accrual, created_at, updated_at";

/// Inserts a new order, unless one with the same number already exists, in which case the existing order is
/// returned. This is not atomic. You can embed this call inside a transaction if you need to, and pass `&mut *tx` as
/// the connection argument.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let result = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO orders (number, user_id, status, accrual, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id;
        "#,
    )
    .bind(&order.number)
    .bind(&order.user_id)
    .bind(OrderStatusType::New)
    .bind(Points::default())
    .bind(order.created_at)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await;
    match result {
        Ok(id) => Ok(InsertOrderResult::Inserted(id)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            trace!("🗃️ Order {} already exists", order.number);
            let existing = fetch_order_by_number(&order.number, conn).await?.ok_or_else(|| {
                SqliteDatabaseError::QueryError(format!("Order {} clashed on insert but cannot be found", order.number))
            })?;
            Ok(InsertOrderResult::AlreadyExists(existing))
        },
        Err(e) => Err(SqliteDatabaseError::from(e)),
    }
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = ?"))
        .bind(number)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are returned in insertion order, i.e. oldest first.
pub async fn fetch_orders(
    filter: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(number) = filter.number {
        where_clause.push("number = ");
        where_clause.push_bind_unseparated(number.0);
    }
    if !filter.statuses.is_empty() {
        where_clause.push("status IN (");
        for (i, status) in filter.statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(id) = filter.after_id {
        where_clause.push("id > ");
        where_clause.push_bind_unseparated(id);
    }
    builder.push(" ORDER BY id ASC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
    }

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {:?}", orders.len());
    Ok(orders)
}

/// Moves the order forward in its lifecycle. The status guard is part of the `UPDATE` statement, so concurrent writers
/// can never move an order backwards.
pub async fn update_order_status(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<UpdateOrderResult, SqliteDatabaseError> {
    let predecessors = status.predecessors();
    if !predecessors.is_empty() {
        let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
        builder.push_bind(status);
        builder.push(", accrual = ");
        builder.push_bind(accrual);
        builder.push(", updated_at = ");
        builder.push_bind(Utc::now());
        builder.push(" WHERE number = ");
        builder.push_bind(number.as_str());
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for predecessor in predecessors {
            statuses.push_bind(*predecessor);
        }
        statuses.push_unseparated(")");
        let rows = builder.build().execute(&mut *conn).await?.rows_affected();
        if rows > 0 {
            debug!("🗃️ Order {number} is now {status} with accrual {accrual}");
            return Ok(UpdateOrderResult::Updated);
        }
    }
    match fetch_order_by_number(number, conn).await? {
        None => Err(SqliteDatabaseError::OrderNotFound(number.to_string())),
        Some(order) if order.status == status => Ok(UpdateOrderResult::Unchanged),
        Some(order) => Ok(UpdateOrderResult::Rejected(order.status)),
    }
}
