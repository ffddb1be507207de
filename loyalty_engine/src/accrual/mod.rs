//! Accrual synchronization.
//!
//! Orders are registered long before the external accrual service has calculated their reward. This module keeps
//! polling the service for every unfinished order and writes the results back:
//!
//! * [`JobReader`] periodically queues a [`CheckJob`] for orders that are still `New` or `Processing`.
//! * Check workers ([`spawn_check_workers`]) poll the [`AccrualClient`] for each job, following the [`next_action`]
//!   retry policy. The [`InFlightSet`] makes sure only one worker polls a given order, and the [`RateLimitGate`]
//!   pauses every worker when the service asks us to slow down.
//! * The [`UpdatePipeline`] persists the results it receives from the check workers and credits processed orders.
//!
//! [`AccrualSynchronizer`] wires the three stages together and owns their lifecycle.
mod client;
mod config;
mod errors;
mod http_client;
mod in_flight;
mod job_reader;
mod jobs;
mod rate_gate;
mod retry;
mod synchronizer;
mod update_pipeline;
mod worker_pool;

pub use client::{AccrualClient, AccrualInfo, AccrualResponse, AccrualStatus};
pub use config::*;
pub use errors::AccrualClientError;
pub use http_client::HttpAccrualClient;
pub use in_flight::{InFlightGuard, InFlightSet};
pub use job_reader::JobReader;
pub use jobs::{CheckJob, UpdateJob};
pub use rate_gate::RateLimitGate;
pub use retry::{next_action, Action, RetryPolicy};
pub use synchronizer::AccrualSynchronizer;
pub use update_pipeline::UpdatePipeline;
pub use worker_pool::{spawn_check_workers, CheckWorkerContext, SharedReceiver};
