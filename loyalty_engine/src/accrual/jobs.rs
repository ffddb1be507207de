use loyalty_common::Points;

use crate::db_types::{OrderNumber, OrderStatusType};

/// A request to poll the accrual service for one order. Jobs live only in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckJob {
    pub user_id: String,
    pub number: OrderNumber,
    pub attempts_remaining: u32,
}

impl CheckJob {
    pub fn new<S: Into<String>>(user_id: S, number: OrderNumber, attempts: u32) -> Self {
        Self { user_id: user_id.into(), number, attempts_remaining: attempts }
    }
}

/// A status change for the update pipeline to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateJob {
    pub user_id: String,
    pub number: OrderNumber,
    pub status: OrderStatusType,
    pub accrual: Points,
}

impl UpdateJob {
    pub fn for_check(job: &CheckJob, status: OrderStatusType, accrual: Points) -> Self {
        Self { user_id: job.user_id.clone(), number: job.number.clone(), status, accrual }
    }
}
