use std::time::Duration;

use log::*;
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{CheckJob, InFlightSet, UpdateJob},
    db::traits::{LedgerManagement, OrderManagement, OrderQueryFilter},
    db_types::OrderStatusType,
};

/// Periodically queues a check for orders that are not finished yet. This picks up orders that were registered
/// while the check queue was full, and orders left over from before a restart.
///
/// Each sweep reads at most `batch_size` orders. Consecutive sweeps page through the backlog, starting over from the
/// oldest order once they reach the end.
///
/// When given the update queue with [`JobReader::with_repairs`], each sweep also replays the update of processed
/// orders that were never credited.
pub struct JobReader<B> {
    db: B,
    jobs: mpsc::Sender<CheckJob>,
    repairs: Option<mpsc::Sender<UpdateJob>>,
    in_flight: InFlightSet,
    interval: Duration,
    batch_size: u32,
    attempts: u32,
    cancel: CancellationToken,
    cursor: i64,
}

impl<B: OrderManagement + LedgerManagement> JobReader<B> {
    pub fn new(
        db: B,
        jobs: mpsc::Sender<CheckJob>,
        in_flight: InFlightSet,
        interval: Duration,
        batch_size: u32,
        attempts: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self { db, jobs, repairs: None, in_flight, interval, batch_size, attempts, cancel, cursor: 0 }
    }

    pub fn with_repairs(mut self, updates: mpsc::Sender<UpdateJob>) -> Self {
        self.repairs = Some(updates);
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Sweeps immediately, and then once per interval until cancelled.
    pub async fn run(mut self) {
        info!("🕰️ Job reader started. Sweeping for unfinished orders every {:?}", self.interval);
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = timer.tick() => {},
            }
            match self.sweep().await {
                Ok(0) => trace!("🕰️ No unfinished orders to queue"),
                Ok(n) => debug!("🕰️ Queued {n} unfinished orders for an accrual check"),
                Err(e) => error!("🕰️ Could not fetch unfinished orders. {e}"),
            }
            match self.repair().await {
                Ok(0) => {},
                Ok(n) => warn!("🕰️ Replayed the update of {n} processed orders that were never credited"),
                Err(e) => error!("🕰️ Could not fetch uncredited orders. {e}"),
            }
        }
        info!("🕰️ Job reader stopped");
    }

    /// Queues a check job for the next batch of unfinished orders that no worker is holding. Waits when the check
    /// queue is full. Returns the number of jobs queued.
    pub async fn sweep(&mut self) -> Result<usize, B::Error> {
        let filter = OrderQueryFilter::default()
            .with_statuses(OrderStatusType::pending())
            .with_id_after(self.cursor)
            .with_limit(self.batch_size);
        let orders = self.db.fetch_orders(filter).await?;
        self.cursor = match orders.last() {
            Some(last) if orders.len() >= self.batch_size as usize => last.id,
            _ => 0,
        };
        let mut queued = 0;
        for order in orders {
            if self.in_flight.contains(&order.number) {
                trace!("🕰️ [{}] Already being checked", order.number);
                continue;
            }
            let job = CheckJob::new(order.user_id, order.number, self.attempts);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = self.jobs.send(job) => {
                    if let Err(e) = sent {
                        warn!("🕰️ [{}] Check queue is closed. Stopping the sweep", e.0.number);
                        break;
                    }
                },
            }
            queued += 1;
        }
        Ok(queued)
    }
    /// Hands a `Processed` update to the update pipeline for each processed order that has no ledger credit, at most
    /// `batch_size` per call. Does nothing unless the reader was built [`with_repairs`](Self::with_repairs). Returns
    /// the number of updates replayed.
    pub async fn repair(&mut self) -> Result<usize, B::Error> {
        let Some(updates) = &self.repairs else { return Ok(0) };
        let orders = self.db.fetch_uncredited_orders(self.batch_size).await?;
        let mut replayed = 0;
        for order in orders {
            debug!("🕰️ [{}] Processed but never credited. Replaying its update", order.number);
            let update = UpdateJob {
                user_id: order.user_id,
                number: order.number,
                status: OrderStatusType::Processed,
                accrual: order.accrual,
            };
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                sent = updates.send(update) => {
                    if let Err(e) = sent {
                        warn!("🕰️ [{}] Update queue is closed. Stopping the repair", e.0.number);
                        break;
                    }
                },
            }
            replayed += 1;
        }
        Ok(replayed)
    }
}
