use log::*;
use loyalty_engine::{
    events::{EventHandlers, EventHooks},
    HttpAccrualClient,
    LoyaltyDatabase,
    OrderService,
    SqliteDatabase,
};
use tokio_util::sync::CancellationToken;

use crate::{config::ServerConfig, errors::ServerError};

const EVENT_BUFFER_SIZE: usize = 64;

/// Runs the accrual synchronizer until the process receives Ctrl-C.
pub async fn run_daemon(config: ServerConfig) -> Result<(), ServerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections).await?;
    db.run_migrations().await?;
    let client = HttpAccrualClient::new(
        &config.accrual_system_address,
        config.sync.request_timeout,
        config.sync.rate_limit_pause,
    )?;
    let handlers = create_logging_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let service = OrderService::new(db.clone(), client, config.sync, producers);
    let shutdown = CancellationToken::new();
    service.start(&shutdown)?;
    info!("🚀️ Accrual synchronizer is running. Press Ctrl-C to stop.");

    let signal = tokio::signal::ctrl_c().await;
    match &signal {
        Ok(()) => info!("🚀️ Shutdown requested. Writing outstanding results."),
        Err(e) => error!("🚀️ Could not listen for the shutdown signal. {e}. Shutting down."),
    }
    shutdown.cancel();
    if let Err(e) = service.stop().await {
        warn!("🚀️ {e}");
    }
    db.close().await?;
    info!("🚀️ Accrual synchronizer stopped");
    signal.map_err(ServerError::from)
}

/// Hooks that report every order outcome in the log. They make the daemon's progress visible without any other
/// subscriber.
pub fn create_logging_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_accrued(|ev| {
        Box::pin(async move {
            info!("📬️ [{}] {} points credited to {}", ev.order_number, ev.accrual, ev.user_id);
        })
    });
    hooks.on_order_invalidated(|ev| {
        Box::pin(async move {
            info!("📬️ [{}] Order of {} will not earn any points", ev.order_number, ev.user_id);
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn logging_hooks_subscribe_to_every_event() {
        let handlers = create_logging_event_handlers();
        let producers = handlers.producers();
        assert_eq!(producers.order_accrued_producer.len(), 1);
        assert_eq!(producers.order_invalidated_producer.len(), 1);
    }
}
