use chrono::{DateTime, Utc};
use loyalty_common::Points;
use serde::{Serialize, Serializer};

use crate::db_types::{LedgerEntry, Order, OrderNumber, OrderStatusType};

/// An order as shown to its owner. The accrual is only shown once the order is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "optional_points_as_float")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then_some(order.accrual);
        Self { number: order.number, status: order.status, accrual, uploaded_at: order.created_at }
    }
}

/// A withdrawal as shown to the user who made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WithdrawalView {
    pub order: OrderNumber,
    #[serde(serialize_with = "points_as_float")]
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<LedgerEntry> for WithdrawalView {
    fn from(entry: LedgerEntry) -> Self {
        Self { order: entry.order_number, sum: entry.sum, processed_at: entry.created_at }
    }
}

pub fn points_as_float<S>(points: &Points, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    serializer.serialize_f64(points.as_f64())
}

pub fn optional_points_as_float<S>(points: &Option<Points>, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    match points {
        Some(p) => serializer.serialize_some(&p.as_f64()),
        None => serializer.serialize_none(),
    }
}
