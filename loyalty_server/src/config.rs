//! Server configuration.
//!
//! Every setting comes from a `LOYALTY_*` environment variable. Missing values fall back to their defaults; values
//! that cannot be parsed, or that are zero, are logged and replaced by the default as well. The server never refuses
//! to start over a tuning knob.
use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use loyalty_engine::AccrualSyncConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty_store.db";
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://localhost:8080";
/// The check workers, update workers and job reader all hold connections at the same time.
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    /// Base URL of the accrual service. Orders are looked up at `{address}/orders/{number}`.
    pub accrual_system_address: String,
    pub max_db_connections: u32,
    pub sync: AccrualSyncConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            accrual_system_address: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            sync: AccrualSyncConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from the variables `var` returns, so that it can be tested without touching the
    /// process environment.
    pub fn from_vars<F>(var: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let sync = defaults.sync;
        let database_url = var("LOYALTY_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ LOYALTY_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            defaults.database_url
        });
        let accrual_system_address = var("LOYALTY_ACCRUAL_SYSTEM_ADDRESS").unwrap_or_else(|| {
            warn!(
                "🪛️ LOYALTY_ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}."
            );
            defaults.accrual_system_address
        });
        let sync = AccrualSyncConfig {
            check_workers: positive(&var, "LOYALTY_CHECK_WORKERS", sync.check_workers),
            update_workers: positive(&var, "LOYALTY_UPDATE_WORKERS", sync.update_workers),
            queue_capacity: positive(&var, "LOYALTY_QUEUE_CAPACITY", sync.queue_capacity),
            attempts: positive(&var, "LOYALTY_ACCRUAL_ATTEMPTS", sync.attempts),
            retry_delay: seconds(&var, "LOYALTY_RETRY_DELAY_SECS", sync.retry_delay),
            sweep_interval: seconds(&var, "LOYALTY_SWEEP_INTERVAL_SECS", sync.sweep_interval),
            sweep_batch_size: positive(&var, "LOYALTY_SWEEP_BATCH_SIZE", sync.sweep_batch_size),
            request_timeout: seconds(&var, "LOYALTY_ACCRUAL_TIMEOUT_SECS", sync.request_timeout),
            rate_limit_pause: seconds(&var, "LOYALTY_RATE_LIMIT_PAUSE_SECS", sync.rate_limit_pause),
        };
        Self { database_url, accrual_system_address, max_db_connections: defaults.max_db_connections, sync }
    }
}

fn positive<F, T>(var: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Display,
    T::Err: Display,
{
    let Some(s) = var(name) else {
        debug!("🪛️ {name} is not set. Using the default value of {default}.");
        return default;
    };
    match s.trim().parse::<T>() {
        Ok(v) if v > T::default() => v,
        Ok(_) => {
            warn!("🪛️ {name} must be greater than zero. Using the default value of {default}.");
            default
        },
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name}: {s}. {e}. Using the default value of {default}.");
            default
        },
    }
}

fn seconds<F>(var: &F, name: &str, default: Duration) -> Duration
where F: Fn(&str) -> Option<String> {
    Duration::from_secs(positive(var, name, default.as_secs()))
}
