mod cucumber;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use futures_util::FutureExt;
use log::*;
use loyalty_engine::{test_utils::prepare_env::drop_database, LoyaltyDatabase};
use tokio::runtime::Runtime;

use crate::cucumber::LoyaltyWorld;

fn main() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let sys = Runtime::new().unwrap();
    sys.block_on(
        LoyaltyWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_f, _r, scenario, ev, w| post_test_hook(scenario, ev, w))
            .run("tests/features"),
    );
    info!("🚀️ Tests complete");
}

fn post_test_hook<'a>(
    scenario: &'a gherkin::Scenario,
    ev: &'a ScenarioFinished,
    world: Option<&'a mut LoyaltyWorld>,
) -> LocalBoxFuture<'a, ()> {
    let fut = async move {
        trace!("🚀️ After-scenario hook running for \"{}\"", scenario.name);
        let Some(LoyaltyWorld { system: Some(sys), .. }) = world else {
            warn!("🚀️ World was not specified. Cannot cleanup database.");
            return;
        };
        if let Err(e) = sys.service.stop().await {
            trace!("🚀️ Synchronizer was not running: {e}");
        }
        match ev {
            ScenarioFinished::StepFailed(_, _, _) | ScenarioFinished::StepSkipped => {
                error!("🚀️ Error in scenario, database retained: {}", sys.db_path);
            },
            ScenarioFinished::StepPassed => {
                debug!("🚀️ Scenario complete, removing database: {}", sys.db_path);
                if let Err(e) = sys.db.close().await {
                    error!("🚀️ Failed to close database: {e}");
                }
                drop_database(&sys.db_path).await;
            },
            _ => trace!("🚀️ Unhandled event: {ev:?}"),
        }
        trace!("🚀️ After-scenario hook complete");
    };
    fut.boxed_local()
}
