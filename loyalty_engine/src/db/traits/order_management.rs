use std::future::Future;

use loyalty_common::Points;

use crate::{
    db::traits::{InsertOrderResult, LoyaltyDatabase, OrderQueryFilter, UpdateOrderResult},
    db_types::{NewOrder, Order, OrderNumber, OrderStatusType},
};

/// The `OrderManagement` trait defines the behaviour for storing and querying orders in the database backend.
pub trait OrderManagement: LoyaltyDatabase {
    /// Stores a new order with status `New`. If an order with the same number already exists, nothing is written and
    /// the existing order is returned in [`InsertOrderResult::AlreadyExists`].
    fn insert_order(&self, order: NewOrder) -> impl Future<Output = Result<InsertOrderResult, Self::Error>> + Send;

    /// Moves the order to `status`, recording `accrual` with it.
    ///
    /// The order lifecycle only ever moves forward (New -> Processing -> Invalid | Processed). Implementations must
    /// check the current status and write in a single statement:
    /// * a legal transition returns [`UpdateOrderResult::Updated`],
    /// * writing the status the order already has returns [`UpdateOrderResult::Unchanged`],
    /// * anything else returns [`UpdateOrderResult::Rejected`] with the current status.
    ///
    /// An unknown order number is an error.
    fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Points,
    ) -> impl Future<Output = Result<UpdateOrderResult, Self::Error>> + Send;

    /// Fetches the orders matching `filter`, oldest first.
    fn fetch_orders(&self, filter: OrderQueryFilter) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send;

    fn fetch_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send;
}
