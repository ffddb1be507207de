//! Check worker behaviour against a scripted accrual service. These tests run on tokio's paused clock, so the retry
//! and rate-limit delays cost no wall-clock time.
use std::{sync::Arc, time::Duration};

use loyalty_common::Points;
use loyalty_engine::{
    accrual::{
        spawn_check_workers,
        AccrualResponse,
        CheckJob,
        CheckWorkerContext,
        InFlightSet,
        RateLimitGate,
        RetryPolicy,
        UpdateJob,
    },
    db_types::{OrderNumber, OrderStatusType},
    test_utils::accrual_stub::ScriptedAccrualClient,
};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{timeout, Instant},
};
use tokio_util::sync::CancellationToken;

const RETRY_DELAY: Duration = Duration::from_secs(1);
const ORDER_A: &str = "79927398713";
const ORDER_B: &str = "12345678903";

struct Harness {
    jobs: mpsc::Sender<CheckJob>,
    updates: mpsc::Receiver<UpdateJob>,
    in_flight: InFlightSet,
    cancel: CancellationToken,
    workers: Vec<JoinHandle<()>>,
}

impl Harness {
    fn start(client: ScriptedAccrualClient, workers: usize) -> Self {
        let _ = env_logger::try_init();
        let (jobs, job_rx) = mpsc::channel(16);
        let (update_tx, updates) = mpsc::channel(16);
        let in_flight = InFlightSet::new();
        let cancel = CancellationToken::new();
        let ctx = CheckWorkerContext {
            client,
            gate: Arc::new(RateLimitGate::new()),
            in_flight: in_flight.clone(),
            policy: RetryPolicy { retry_delay: RETRY_DELAY },
            updates: update_tx,
            cancel: cancel.clone(),
        };
        let workers = spawn_check_workers(workers, Arc::new(Mutex::new(job_rx)), ctx);
        Self { jobs, updates, in_flight, cancel, workers }
    }

    async fn submit(&self, number: &str, attempts: u32) {
        self.jobs.send(CheckJob::new("alice", number.into(), attempts)).await.unwrap();
    }

    /// Collects updates until `n` have arrived or nothing arrives for an hour of (paused) time
    async fn updates(&mut self, n: usize) -> Vec<UpdateJob> {
        let mut result = Vec::with_capacity(n);
        while result.len() < n {
            match timeout(Duration::from_secs(3600), self.updates.recv()).await {
                Ok(Some(update)) => result.push(update),
                _ => break,
            }
        }
        result
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        for worker in self.workers {
            timeout(Duration::from_secs(5), worker).await.expect("worker did not stop").expect("worker panicked");
        }
    }
}

fn processed(hundredths: i64) -> AccrualResponse {
    AccrualResponse::Success { status: OrderStatusType::Processed, accrual: Points::from_hundredths(hundredths) }
}

fn statuses(updates: &[UpdateJob]) -> Vec<OrderStatusType> {
    updates.iter().map(|u| u.status).collect()
}

#[tokio::test(start_paused = true)]
async fn processed_order_is_marked_processing_then_processed() {
    let client = ScriptedAccrualClient::default();
    client.script(ORDER_A, [processed(3750)]);
    let mut harness = Harness::start(client.clone(), 2);
    harness.submit(ORDER_A, 2).await;
    let updates = harness.updates(2).await;
    assert_eq!(statuses(&updates), vec![OrderStatusType::Processing, OrderStatusType::Processed]);
    assert_eq!(updates[1].accrual, Points::from_hundredths(3750));
    assert_eq!(updates[1].user_id, "alice");
    assert_eq!(client.calls_for(&ORDER_A.into()).len(), 1);
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn processing_orders_are_polled_until_they_finish() {
    let client = ScriptedAccrualClient::default();
    let processing = AccrualResponse::Success { status: OrderStatusType::Processing, accrual: Points::default() };
    client.script(ORDER_A, [processing.clone(), processing, processed(100)]);
    let mut harness = Harness::start(client.clone(), 1);
    harness.submit(ORDER_A, 1).await;
    let updates = harness.updates(4).await;
    assert_eq!(statuses(&updates), vec![
        OrderStatusType::Processing,
        OrderStatusType::Processing,
        OrderStatusType::Processing,
        OrderStatusType::Processed
    ]);
    let calls = client.calls_for(&ORDER_A.into());
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= RETRY_DELAY);
    }
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn attempt_budget_runs_out_on_unknown_orders() {
    let client = ScriptedAccrualClient::new(AccrualResponse::NotFoundYet);
    let mut harness = Harness::start(client.clone(), 2);
    harness.submit(ORDER_A, 2).await;
    let updates = harness.updates(2).await;
    assert_eq!(statuses(&updates), vec![OrderStatusType::Processing, OrderStatusType::Invalid]);
    assert_eq!(client.calls_for(&ORDER_A.into()).len(), 2);
    // Nothing else is scheduled for the order
    tokio::time::sleep(RETRY_DELAY * 30).await;
    assert_eq!(client.calls_for(&ORDER_A.into()).len(), 2);
    assert!(harness.in_flight.is_empty());
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failures_and_rate_limits_do_not_use_up_attempts() {
    let client = ScriptedAccrualClient::default();
    let failure = AccrualResponse::OtherFailure("connection refused".into());
    let limited = AccrualResponse::RateLimited { retry_after: Duration::from_secs(2) };
    client.script(ORDER_A, [
        failure.clone(),
        limited.clone(),
        failure,
        AccrualResponse::NotFoundYet,
        limited,
        processed(500),
    ]);
    let mut harness = Harness::start(client.clone(), 1);
    harness.submit(ORDER_A, 2).await;
    let updates = harness.updates(2).await;
    assert_eq!(statuses(&updates), vec![OrderStatusType::Processing, OrderStatusType::Processed]);
    assert_eq!(client.calls_for(&ORDER_A.into()).len(), 6);
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rate_limit_pauses_every_worker() {
    let client = ScriptedAccrualClient::default();
    client.script(ORDER_A, [AccrualResponse::RateLimited { retry_after: Duration::from_secs(5) }, processed(100)]);
    client.script(ORDER_B, [processed(200)]);
    let mut harness = Harness::start(client.clone(), 2);
    harness.submit(ORDER_A, 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let limited_at = client.calls_for(&ORDER_A.into())[0];
    harness.submit(ORDER_B, 2).await;

    let updates = harness.updates(4).await;
    let done = updates.iter().filter(|u| u.status == OrderStatusType::Processed).count();
    assert_eq!(done, 2);
    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    for call in &calls[1..] {
        let waited = call.at.duration_since(limited_at);
        assert!(waited >= Duration::from_secs(5), "{} was called only {waited:?} after the rate limit", call.number);
    }
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn duplicate_jobs_never_poll_concurrently() {
    let client = ScriptedAccrualClient::default().with_latency(Duration::from_secs(2));
    client.script(ORDER_A, [processed(100)]);
    let mut harness = Harness::start(client.clone(), 4);
    for _ in 0..4 {
        harness.submit(ORDER_A, 2).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(harness.in_flight.len(), 1);
    let updates = harness.updates(2).await;
    assert_eq!(statuses(&updates), vec![OrderStatusType::Processing, OrderStatusType::Processed]);
    let number: OrderNumber = ORDER_A.into();
    assert_eq!(client.max_concurrent_calls(&number), 1);
    assert_eq!(client.calls_for(&number).len(), 1);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(harness.in_flight.is_empty());
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn jobs_without_attempts_are_skipped() {
    let client = ScriptedAccrualClient::default();
    let mut harness = Harness::start(client.clone(), 1);
    harness.submit(ORDER_A, 0).await;
    harness.submit(ORDER_B, 1).await;
    let updates = harness.updates(2).await;
    assert!(updates.iter().all(|u| u.number.as_str() == ORDER_B));
    assert!(client.calls_for(&ORDER_A.into()).is_empty());
    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_abandons_the_request_and_releases_the_order() {
    let client = ScriptedAccrualClient::default().with_latency(Duration::from_secs(3600));
    client.script(ORDER_A, [processed(100)]);
    let mut harness = Harness::start(client.clone(), 1);
    harness.submit(ORDER_A, 2).await;
    let updates = harness.updates(1).await;
    assert_eq!(statuses(&updates), vec![OrderStatusType::Processing]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(harness.in_flight.len(), 1);

    let started = Instant::now();
    let in_flight = harness.in_flight.clone();
    harness.cancel.cancel();
    for worker in harness.workers.drain(..) {
        worker.await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(in_flight.is_empty());
    // The check workers held the only update senders
    assert!(harness.updates.recv().await.is_none());
}
