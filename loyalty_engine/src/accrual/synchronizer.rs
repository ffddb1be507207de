use std::sync::Arc;

use log::*;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        Mutex,
    },
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{
        spawn_check_workers,
        AccrualClient,
        AccrualSyncConfig,
        CheckJob,
        CheckWorkerContext,
        InFlightSet,
        JobReader,
        RateLimitGate,
        RetryPolicy,
        UpdatePipeline,
    },
    db::traits::{LedgerManagement, OrderManagement},
    events::EventProducers,
};

/// The running accrual synchronizer: the job reader, the check workers and the update workers, and the queues
/// between them.
pub struct AccrualSynchronizer {
    cancel: CancellationToken,
    check_jobs: mpsc::Sender<CheckJob>,
    in_flight: InFlightSet,
    gate: Arc<RateLimitGate>,
    reader: JoinHandle<()>,
    check_workers: Vec<JoinHandle<()>>,
    update_workers: Vec<JoinHandle<()>>,
}

impl AccrualSynchronizer {
    /// Wires the components together and starts their tasks. The synchronizer also stops when `shutdown` is
    /// cancelled, but [`Self::stop`] must still be called to wait for the update queue to drain.
    pub fn start<B, C>(
        db: B,
        client: C,
        config: &AccrualSyncConfig,
        producers: EventProducers,
        shutdown: &CancellationToken,
    ) -> Self
    where
        B: OrderManagement + LedgerManagement,
        C: AccrualClient,
    {
        let cancel = shutdown.child_token();
        let capacity = config.queue_capacity.max(1);
        let (check_jobs, check_rx) = mpsc::channel(capacity);
        let (updates, update_rx) = mpsc::channel(capacity);
        let in_flight = InFlightSet::new();
        let gate = Arc::new(RateLimitGate::new());

        let update_workers = UpdatePipeline::new(db.clone(), producers)
            .spawn_workers(config.update_workers.max(1), Arc::new(Mutex::new(update_rx)));
        let ctx = CheckWorkerContext {
            client,
            gate: Arc::clone(&gate),
            in_flight: in_flight.clone(),
            policy: RetryPolicy { retry_delay: config.retry_delay },
            updates,
            cancel: cancel.clone(),
        };
        let repairs = ctx.updates.clone();
        let check_workers = spawn_check_workers(config.check_workers.max(1), Arc::new(Mutex::new(check_rx)), ctx);
        let reader = JobReader::new(
            db,
            check_jobs.clone(),
            in_flight.clone(),
            config.sweep_interval,
            config.sweep_batch_size.max(1),
            config.attempts.max(1),
            cancel.clone(),
        )
        .with_repairs(repairs)
        .spawn();
        info!(
            "🔄️ Accrual synchronizer started with {} check workers and {} update workers",
            check_workers.len(),
            update_workers.len()
        );
        Self { cancel, check_jobs, in_flight, gate, reader, check_workers, update_workers }
    }

    /// Queues a check without waiting. If the queue is full, the job is handed back and the order will be picked up
    /// by a later sweep.
    pub fn try_enqueue(&self, job: CheckJob) -> Result<(), TrySendError<CheckJob>> {
        if self.cancel.is_cancelled() {
            return Err(TrySendError::Closed(job));
        }
        self.check_jobs.try_send(job)
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops polling and waits for every task to finish. Results that have already been handed to the update
    /// pipeline are written before this returns; checks that were still queued are dropped and picked up again by the
    /// job reader on the next start.
    pub async fn stop(self) {
        info!("🔄️ Stopping the accrual synchronizer");
        let Self { cancel, check_jobs, reader, check_workers, update_workers, .. } = self;
        cancel.cancel();
        drop(check_jobs);
        if let Err(e) = reader.await {
            error!("🔄️ Job reader did not shut down cleanly. {e}");
        }
        // The reader and the check workers own the update queue's senders. Once they are gone the update queue closes.
        for (id, handle) in check_workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("🔄️ Check worker {id} did not shut down cleanly. {e}");
            }
        }
        for (id, handle) in update_workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!("🔄️ Update worker {id} did not shut down cleanly. {e}");
            }
        }
        info!("🔄️ Accrual synchronizer stopped");
    }
}
