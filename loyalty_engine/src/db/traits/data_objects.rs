use loyalty_common::Points;

use crate::db_types::{Order, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOrderResult {
    Inserted(i64),
    /// An order with the same number is already stored. The stored order is returned so that the caller can check
    /// who owns it.
    AlreadyExists(Order),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrderResult {
    Updated,
    /// The order already had the requested status. Nothing was written.
    Unchanged,
    /// The transition is not allowed from the order's current status, which is returned.
    Rejected(OrderStatusType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIncomeResult {
    Inserted(i64),
    /// The order has been credited before.
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitExpenseResult {
    Debited(i64),
    InsufficientFunds(Points),
}

#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub number: Option<OrderNumber>,
    pub statuses: Vec<OrderStatusType>,
    /// Only orders with a row id greater than this
    pub after_id: Option<i64>,
    pub limit: Option<u32>,
}

impl OrderQueryFilter {
    pub fn with_user_id<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_number(mut self, number: OrderNumber) -> Self {
        self.number = Some(number);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_statuses<I: IntoIterator<Item = OrderStatusType>>(mut self, statuses: I) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn with_id_after(mut self, id: i64) -> Self {
        self.after_id = Some(id);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.number.is_none() && self.statuses.is_empty() && self.after_id.is_none()
    }
}
