use std::{fmt::Debug, time::Duration};

use cucumber::World;
use log::*;
use loyalty_engine::{
    events::EventProducers,
    order_objects::OrderView,
    test_utils::{
        accrual_stub::ScriptedAccrualClient,
        prepare_env::{prepare_test_env, random_db_path},
    },
    AccrualSyncConfig,
    LedgerApi,
    OrderApiError,
    OrderService,
    SqliteDatabase,
};
use tokio_util::sync::CancellationToken;

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub last_result: Option<Result<(), OrderApiError>>,
}

pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub client: ScriptedAccrualClient,
    pub service: OrderService<SqliteDatabase, ScriptedAccrualClient>,
    pub ledger: LedgerApi<SqliteDatabase>,
    pub shutdown: CancellationToken,
}

impl Debug for LoyaltySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LoyaltySystem ({})", self.db_path)
    }
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        let db = prepare_test_env(&db_path).await;
        debug!("🚀️ Created database: {db_path}");
        let client = ScriptedAccrualClient::default();
        let config = AccrualSyncConfig {
            check_workers: 2,
            update_workers: 2,
            retry_delay: Duration::from_millis(50),
            sweep_interval: Duration::from_millis(250),
            ..Default::default()
        };
        let service = OrderService::new(db.clone(), client.clone(), config, EventProducers::default());
        let ledger = LedgerApi::new(db.clone());
        Self { db_path, db, client, service, ledger, shutdown: CancellationToken::new() }
    }
}

impl LoyaltyWorld {
    pub fn system(&self) -> &LoyaltySystem {
        self.system.as_ref().expect("Loyalty system not initialised")
    }

    pub async fn orders(&self, user: &str) -> Vec<OrderView> {
        self.system().service.list(user).await.expect("Error listing orders")
    }

    pub async fn order(&self, user: &str, number: &str) -> Option<OrderView> {
        self.orders(user).await.into_iter().find(|o| o.number.as_str() == number)
    }
}
