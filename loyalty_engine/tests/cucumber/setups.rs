use cucumber::given;
use loyalty_common::Points;
use loyalty_engine::{accrual::AccrualResponse, db_types::OrderStatusType};

use crate::cucumber::{world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the accrual service awards {float} points for order {word}")]
async fn accrual_processed(world: &mut LoyaltyWorld, points: f64, number: String) {
    let accrual = Points::from_f64(points).expect("Invalid points amount");
    let response = AccrualResponse::Success { status: OrderStatusType::Processed, accrual };
    world.system().client.script(number, [response]);
}

#[given(expr = "the accrual service is still processing order {word}")]
async fn accrual_processing(world: &mut LoyaltyWorld, number: String) {
    let response = AccrualResponse::Success { status: OrderStatusType::Processing, accrual: Points::default() };
    world.system().client.script(number, [response]);
}

#[given(expr = "the accrual service rejects order {word}")]
async fn accrual_invalid(world: &mut LoyaltyWorld, number: String) {
    let response = AccrualResponse::Success { status: OrderStatusType::Invalid, accrual: Points::default() };
    world.system().client.script(number, [response]);
}

#[given(expr = "the accrual service does not know order {word}")]
async fn accrual_unknown(world: &mut LoyaltyWorld, number: String) {
    world.system().client.script(number, [AccrualResponse::NotFoundYet]);
}

#[given("the synchronizer is running")]
async fn synchronizer_running(world: &mut LoyaltyWorld) {
    let system = world.system();
    system.service.start(&system.shutdown).expect("Error starting the synchronizer");
}
