use std::{
    fmt::Debug,
    sync::{Mutex, MutexGuard, PoisonError},
};

use log::*;
use loyalty_common::helpers::is_valid_order_number;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{AccrualClient, AccrualSyncConfig, AccrualSynchronizer, CheckJob},
    db::traits::{InsertOrderResult, LedgerManagement, OrderManagement, OrderQueryFilter},
    db_types::{NewOrder, OrderNumber},
    events::EventProducers,
    lpe_api::{errors::OrderApiError, order_objects::OrderView},
};

/// `OrderService` registers orders and keeps their accrual status up to date.
///
/// Registration only stores the order and queues a check; it never waits for the accrual service. The checks run in
/// the [`AccrualSynchronizer`] between [`Self::start`] and [`Self::stop`]. Orders registered while the synchronizer
/// is stopped are checked after the next start.
pub struct OrderService<B, C> {
    db: B,
    client: C,
    config: AccrualSyncConfig,
    producers: EventProducers,
    synchronizer: Mutex<Option<AccrualSynchronizer>>,
}

impl<B, C> Debug for OrderService<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderService")
    }
}

impl<B, C> OrderService<B, C>
where
    B: OrderManagement + LedgerManagement,
    C: AccrualClient,
{
    pub fn new(db: B, client: C, config: AccrualSyncConfig, producers: EventProducers) -> Self {
        Self { db, client, config, producers, synchronizer: Mutex::new(None) }
    }

    pub fn config(&self) -> &AccrualSyncConfig {
        &self.config
    }

    /// Starts the accrual synchronizer. It stops when `shutdown` is cancelled or [`Self::stop`] is called.
    pub fn start(&self, shutdown: &CancellationToken) -> Result<(), OrderApiError> {
        let mut synchronizer = self.synchronizer();
        if synchronizer.as_ref().is_some_and(|s| !s.is_stopping()) {
            return Err(OrderApiError::AlreadyStarted);
        }
        let started = AccrualSynchronizer::start(
            self.db.clone(),
            self.client.clone(),
            &self.config,
            self.producers.clone(),
            shutdown,
        );
        if let Some(previous) = synchronizer.replace(started) {
            // A synchronizer that was cancelled from outside but never stopped. Let it wind down in the background.
            tokio::spawn(previous.stop());
        }
        Ok(())
    }

    /// Stops the accrual synchronizer and waits until every result it has collected has been written.
    pub async fn stop(&self) -> Result<(), OrderApiError> {
        let synchronizer = self.synchronizer().take();
        match synchronizer {
            Some(s) => {
                s.stop().await;
                Ok(())
            },
            None => Err(OrderApiError::ServiceStopped),
        }
    }

    pub fn is_running(&self) -> bool {
        self.synchronizer().as_ref().is_some_and(|s| !s.is_stopping())
    }

    /// Registers a new order for the user and queues an accrual check for it.
    ///
    /// Fails with
    /// * [`OrderApiError::InvalidFormat`] if the user id or the number is empty,
    /// * [`OrderApiError::WrongNumberOfOrder`] if the number fails the checksum,
    /// * [`OrderApiError::UploadedByYouAlready`] if the user has registered this order before,
    /// * [`OrderApiError::Duplicate`] if the order belongs to someone else.
    ///
    /// The order is stored even if the check queue is full; the job reader will get to it.
    pub async fn register(&self, user_id: &str, number: &str) -> Result<(), OrderApiError> {
        if user_id.is_empty() {
            return Err(OrderApiError::InvalidFormat("user id is empty".to_string()));
        }
        if number.is_empty() {
            return Err(OrderApiError::InvalidFormat("order number is empty".to_string()));
        }
        if !is_valid_order_number(number) {
            return Err(OrderApiError::WrongNumberOfOrder(number.to_string()));
        }
        let number = OrderNumber::from(number);
        let order = NewOrder::new(number.clone(), user_id);
        let result =
            self.db.insert_order(order).await.map_err(|e| OrderApiError::DatabaseError(e.to_string()))?;
        match result {
            InsertOrderResult::Inserted(id) => {
                info!("🔄️📦️ [{number}] Order registered for {user_id} with id {id}");
            },
            InsertOrderResult::AlreadyExists(existing) if existing.user_id == user_id => {
                debug!("🔄️📦️ [{number}] {user_id} uploaded the order again");
                return Err(OrderApiError::UploadedByYouAlready(number.as_str().to_string()));
            },
            InsertOrderResult::AlreadyExists(_) => {
                warn!("🔄️📦️ [{number}] {user_id} tried to upload an order that belongs to another user");
                return Err(OrderApiError::Duplicate(number.as_str().to_string()));
            },
        }
        self.enqueue(CheckJob::new(user_id, number, self.config.attempts));
        Ok(())
    }

    /// All the user's orders, oldest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<OrderView>, OrderApiError> {
        if user_id.is_empty() {
            return Err(OrderApiError::InvalidFormat("user id is empty".to_string()));
        }
        let filter = OrderQueryFilter::default().with_user_id(user_id);
        let mut orders =
            self.db.fetch_orders(filter).await.map_err(|e| OrderApiError::DatabaseError(e.to_string()))?;
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        trace!("🔄️📦️ {user_id} has {} orders", orders.len());
        Ok(orders.into_iter().map(OrderView::from).collect())
    }

    fn enqueue(&self, job: CheckJob) {
        let synchronizer = self.synchronizer();
        let Some(synchronizer) = synchronizer.as_ref() else {
            debug!("🔄️📦️ [{}] Accrual synchronizer is not running. The order will be checked after it starts", job.number);
            return;
        };
        match synchronizer.try_enqueue(job) {
            Ok(()) => {},
            Err(TrySendError::Full(job)) => {
                warn!("🔄️📦️ [{}] Check queue is full. The order will be picked up by the next sweep", job.number);
            },
            Err(TrySendError::Closed(job)) => {
                debug!("🔄️📦️ [{}] Accrual synchronizer is stopping. The order will be checked after a restart", job.number);
            },
        }
    }

    fn synchronizer(&self) -> MutexGuard<'_, Option<AccrualSynchronizer>> {
        self.synchronizer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
