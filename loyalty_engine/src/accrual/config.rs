use std::time::Duration;

pub const DEFAULT_CHECK_WORKERS: usize = 4;
pub const DEFAULT_UPDATE_WORKERS: usize = 2;
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;
pub const DEFAULT_ACCRUAL_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_SWEEP_BATCH_SIZE: u32 = 50;
pub const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

/// Tuning knobs for the accrual synchronizer.
#[derive(Debug, Clone)]
pub struct AccrualSyncConfig {
    /// Number of workers polling the accrual service
    pub check_workers: usize,
    /// Number of workers writing results to the database
    pub update_workers: usize,
    /// Capacity of both the check queue and the update queue
    pub queue_capacity: usize,
    /// How many times the accrual service may answer "unknown order" before the order is marked invalid
    pub attempts: u32,
    /// Pause between polls of the same order
    pub retry_delay: Duration,
    /// How often the database is swept for unfinished orders
    pub sweep_interval: Duration,
    /// Maximum number of orders enqueued per sweep
    pub sweep_batch_size: u32,
    /// Timeout for a single request to the accrual service
    pub request_timeout: Duration,
    /// How long to back off after a rate-limit response that does not say how long to wait
    pub rate_limit_pause: Duration,
}

impl Default for AccrualSyncConfig {
    fn default() -> Self {
        Self {
            check_workers: DEFAULT_CHECK_WORKERS,
            update_workers: DEFAULT_UPDATE_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            attempts: DEFAULT_ACCRUAL_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            request_timeout: DEFAULT_ACCRUAL_TIMEOUT,
            rate_limit_pause: DEFAULT_RATE_LIMIT_PAUSE,
        }
    }
}
