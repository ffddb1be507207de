use std::{fmt::Debug, sync::Arc};

use log::*;
use tokio::task::JoinHandle;

use crate::{
    accrual::{worker_pool::SharedReceiver, UpdateJob},
    db::traits::{InsertIncomeResult, LedgerManagement, OrderManagement, UpdateOrderResult},
    db_types::OrderStatusType,
    events::{EventProducers, OrderAccruedEvent, OrderInvalidatedEvent},
};

/// Persists the results of accrual checks.
///
/// The status is always written before the ledger. A crash between the two writes leaves a processed order that has
/// not been credited yet. The job reader finds such orders on its sweeps and replays their update through this
/// pipeline, which credits them. The ledger refuses to credit an order twice, so replaying an update any number of
/// times is safe.
pub struct UpdatePipeline<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for UpdatePipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UpdatePipeline")
    }
}

impl<B> UpdatePipeline<B>
where B: OrderManagement + LedgerManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Starts `count` update workers. They drain the queue and stop once every sender has been dropped.
    pub fn spawn_workers(self, count: usize, updates: SharedReceiver<UpdateJob>) -> Vec<JoinHandle<()>> {
        let pipeline = Arc::new(self);
        (0..count)
            .map(|id| {
                let updates = Arc::clone(&updates);
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    debug!("🗃️ Update worker {id} started");
                    loop {
                        let update = updates.lock().await.recv().await;
                        let Some(update) = update else { break };
                        let number = update.number.clone();
                        if let Err(e) = pipeline.apply(&update).await {
                            error!("🗃️ [{number}] Could not persist {} update. The update is dropped. {e}", update.status);
                        }
                    }
                    debug!("🗃️ Update worker {id} stopped");
                })
            })
            .collect()
    }

    /// Writes the order status and, for processed orders, credits the accrual to the user.
    pub async fn apply(&self, update: &UpdateJob) -> Result<(), B::Error> {
        let number = &update.number;
        let result = self.db.update_order_status(number, update.status, update.accrual).await?;
        match result {
            UpdateOrderResult::Updated => {
                debug!("🗃️ [{number}] Order status is now {}", update.status);
                if update.status == OrderStatusType::Invalid {
                    self.call_order_invalidated_hook(update).await;
                }
            },
            UpdateOrderResult::Unchanged => {
                trace!("🗃️ [{number}] Order status is already {}", update.status);
            },
            UpdateOrderResult::Rejected(current) => {
                warn!("🗃️ [{number}] Order cannot move from {current} to {}. Ignoring the update", update.status);
                return Ok(());
            },
        }
        if update.status == OrderStatusType::Processed {
            match self.db.credit_income(&update.user_id, number, update.accrual).await? {
                InsertIncomeResult::Inserted(_) => {
                    info!("🗃️ [{number}] {} points credited to {}", update.accrual, update.user_id);
                    self.call_order_accrued_hook(update).await;
                },
                InsertIncomeResult::AlreadyExists => {
                    trace!("🗃️ [{number}] Order has already been credited");
                },
            }
        }
        Ok(())
    }

    async fn call_order_accrued_hook(&self, update: &UpdateJob) {
        for emitter in &self.producers.order_accrued_producer {
            debug!("🗃️ Notifying order accrued hook subscribers");
            let event = OrderAccruedEvent::new(update.user_id.clone(), update.number.clone(), update.accrual);
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_invalidated_hook(&self, update: &UpdateJob) {
        for emitter in &self.producers.order_invalidated_producer {
            debug!("🗃️ Notifying order invalidated hook subscribers");
            let event = OrderInvalidatedEvent::new(update.user_id.clone(), update.number.clone());
            emitter.publish_event(event).await;
        }
    }
}
