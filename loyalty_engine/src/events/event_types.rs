use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::OrderNumber;

/// Published once an order's accrual has been credited to the user's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccruedEvent {
    pub user_id: String,
    pub order_number: OrderNumber,
    pub accrual: Points,
}

impl OrderAccruedEvent {
    pub fn new<S: Into<String>>(user_id: S, order_number: OrderNumber, accrual: Points) -> Self {
        Self { user_id: user_id.into(), order_number, accrual }
    }
}

/// Published when an order is first marked as invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInvalidatedEvent {
    pub user_id: String,
    pub order_number: OrderNumber,
}

impl OrderInvalidatedEvent {
    pub fn new<S: Into<String>>(user_id: S, order_number: OrderNumber) -> Self {
        Self { user_id: user_id.into(), order_number }
    }
}
