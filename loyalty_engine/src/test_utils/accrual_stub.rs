use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::Instant;

use crate::{
    accrual::{AccrualClient, AccrualResponse},
    db_types::OrderNumber,
};

/// A call the stub received
#[derive(Debug, Clone)]
pub struct AccrualCall {
    pub number: OrderNumber,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct StubState {
    scripts: HashMap<OrderNumber, VecDeque<AccrualResponse>>,
    calls: Vec<AccrualCall>,
    active: HashMap<OrderNumber, usize>,
    max_active: HashMap<OrderNumber, usize>,
}

/// An [`AccrualClient`] that replays canned responses and records every call.
///
/// Each order has its own script. Responses are handed out in order, and the last one repeats forever. Orders without
/// a script get the default response.
#[derive(Debug, Clone)]
pub struct ScriptedAccrualClient {
    state: Arc<Mutex<StubState>>,
    default_response: AccrualResponse,
    latency: Duration,
}

impl Default for ScriptedAccrualClient {
    fn default() -> Self {
        Self::new(AccrualResponse::NotFoundYet)
    }
}

impl ScriptedAccrualClient {
    pub fn new(default_response: AccrualResponse) -> Self {
        Self { state: Arc::default(), default_response, latency: Duration::ZERO }
    }

    /// Every call takes this long to answer
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script<N, I>(&self, number: N, responses: I) -> &Self
    where
        N: Into<OrderNumber>,
        I: IntoIterator<Item = AccrualResponse>,
    {
        self.lock().scripts.insert(number.into(), responses.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<AccrualCall> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, number: &OrderNumber) -> Vec<Instant> {
        self.lock().calls.iter().filter(|c| &c.number == number).map(|c| c.at).collect()
    }

    /// The largest number of calls for the order that were in progress at the same time
    pub fn max_concurrent_calls(&self, number: &OrderNumber) -> usize {
        self.lock().max_active.get(number).copied().unwrap_or_default()
    }

    fn next_response(&self, number: &OrderNumber) -> AccrualResponse {
        let mut state = self.lock();
        state.calls.push(AccrualCall { number: number.clone(), at: Instant::now() });
        let active = state.active.entry(number.clone()).or_default();
        *active += 1;
        let active = *active;
        let max = state.max_active.entry(number.clone()).or_default();
        *max = (*max).max(active);
        match state.scripts.get_mut(number) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(self.default_response.clone()),
            Some(script) => script.front().cloned().unwrap_or(self.default_response.clone()),
            None => self.default_response.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ActiveCall<'a> {
    stub: &'a ScriptedAccrualClient,
    number: &'a OrderNumber,
}

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        if let Some(active) = self.stub.lock().active.get_mut(self.number) {
            *active = active.saturating_sub(1);
        }
    }
}

impl AccrualClient for ScriptedAccrualClient {
    async fn check(&self, number: &OrderNumber) -> AccrualResponse {
        let response = self.next_response(number);
        let _active = ActiveCall { stub: self, number };
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        response
    }
}
