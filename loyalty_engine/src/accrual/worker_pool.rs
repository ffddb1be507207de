use std::{sync::Arc, time::Duration};

use log::*;
use loyalty_common::Points;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{next_action, AccrualClient, Action, CheckJob, InFlightSet, RateLimitGate, RetryPolicy, UpdateJob},
    db_types::OrderStatusType,
};

pub type SharedReceiver<T> = Arc<Mutex<mpsc::Receiver<T>>>;

/// Everything a check worker needs. One instance is shared by all workers of the pool.
pub struct CheckWorkerContext<C> {
    pub client: C,
    pub gate: Arc<RateLimitGate>,
    pub in_flight: InFlightSet,
    pub policy: RetryPolicy,
    pub updates: mpsc::Sender<UpdateJob>,
    pub cancel: CancellationToken,
}

/// Starts `count` check workers that take jobs from `jobs` until the queue is closed or `ctx.cancel` fires.
///
/// Each worker holds a clone of the update queue sender. The update queue closes once every worker has stopped.
pub fn spawn_check_workers<C: AccrualClient>(
    count: usize,
    jobs: SharedReceiver<CheckJob>,
    ctx: CheckWorkerContext<C>,
) -> Vec<JoinHandle<()>> {
    let ctx = Arc::new(ctx);
    (0..count)
        .map(|id| {
            let jobs = Arc::clone(&jobs);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move { run_check_worker(id, jobs, ctx).await })
        })
        .collect()
}

async fn run_check_worker<C: AccrualClient>(id: usize, jobs: SharedReceiver<CheckJob>, ctx: Arc<CheckWorkerContext<C>>) {
    debug!("🔄️ Check worker {id} started");
    loop {
        let job = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            job = next_job(&jobs) => match job {
                Some(job) => job,
                None => break,
            },
        };
        ctx.process(job).await;
    }
    debug!("🔄️ Check worker {id} stopped");
}

async fn next_job<T>(jobs: &SharedReceiver<T>) -> Option<T> {
    jobs.lock().await.recv().await
}

impl<C: AccrualClient> CheckWorkerContext<C> {
    /// Polls the accrual service for the job's order until there is a final answer, the attempt budget runs out, or
    /// the worker is cancelled.
    pub async fn process(&self, mut job: CheckJob) {
        let number = job.number.clone();
        if job.attempts_remaining == 0 {
            warn!("🔄️ [{number}] Check job arrived with no attempts left. Skipping it");
            return;
        }
        let Some(_claim) = self.in_flight.try_acquire(&number) else {
            debug!("🔄️ [{number}] Already being checked by another worker. Dropping the duplicate job");
            return;
        };
        trace!("🔄️ [{number}] Checking accrual with {} attempts left", job.attempts_remaining);
        self.submit(UpdateJob::for_check(&job, OrderStatusType::Processing, Points::default())).await;
        loop {
            if !self.wait_for_gate().await {
                return;
            }
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("🔄️ [{number}] Shutting down. Abandoning the accrual request");
                    return;
                },
                response = self.client.check(&number) => response,
            };
            trace!("🔄️ [{number}] Accrual service responded with {response:?}");
            let (action, remaining) = next_action(&response, job.attempts_remaining, &self.policy);
            job.attempts_remaining = remaining;
            match action {
                Action::Complete { status, accrual } => {
                    info!("🔄️ [{number}] Accrual check complete. Status: {status}, accrual: {accrual}");
                    self.submit(UpdateJob::for_check(&job, status, accrual)).await;
                    return;
                },
                Action::UpdateAndRetry { status, accrual, delay } => {
                    debug!("🔄️ [{number}] Order is still being processed. Checking again in {delay:?}");
                    self.submit(UpdateJob::for_check(&job, status, accrual)).await;
                    if !self.sleep(delay).await {
                        return;
                    }
                },
                Action::Retry(delay) => {
                    debug!("🔄️ [{number}] No answer yet ({response:?}). {remaining} attempts left. Retrying in {delay:?}");
                    if !self.sleep(delay).await {
                        return;
                    }
                },
                Action::Throttle(retry_after) => {
                    if self.gate.raise(retry_after) {
                        warn!("🔄️ [{number}] Accrual service is rate limiting us. Pausing all checks for {retry_after:?}");
                    }
                },
            }
        }
    }

    /// Hands the update to the update pipeline. This waits if the update queue is full.
    async fn submit(&self, update: UpdateJob) {
        let number = update.number.clone();
        if let Err(e) = self.updates.send(update).await {
            error!("🔄️ [{number}] Update queue is closed. The update {:?} is lost", e.0.status);
        }
    }

    /// Sleeps until the rate-limit gate opens. Returns false if the worker was cancelled in the meantime.
    async fn wait_for_gate(&self) -> bool {
        loop {
            let wait = self.gate.must_wait();
            if wait.is_zero() {
                return true;
            }
            trace!("🔄️ Rate-limit gate is closed for another {wait:?}");
            if !self.sleep(wait).await {
                return false;
            }
        }
    }

    /// Returns false if the worker was cancelled before `delay` elapsed.
    async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
