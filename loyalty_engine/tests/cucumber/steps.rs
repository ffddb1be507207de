use std::time::Duration;

use cucumber::{then, when};
use loyalty_common::Points;
use loyalty_engine::{db_types::OrderStatusType, OrderApiError};
use tokio::time::Instant;

use crate::cucumber::LoyaltyWorld;

#[when(expr = "'{word}' registers order {word}")]
async fn register_order(world: &mut LoyaltyWorld, user: String, number: String) {
    let result = world.system().service.register(&user, &number).await;
    world.last_result = Some(result);
}

#[when(expr = "'{word}' registers an order without a number")]
async fn register_empty_order(world: &mut LoyaltyWorld, user: String) {
    let result = world.system().service.register(&user, "").await;
    world.last_result = Some(result);
}

#[when(expr = "'{word}' withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, user: String, points: f64, number: String) {
    let sum = Points::from_f64(points).expect("Invalid points amount");
    world.system().ledger.withdraw(&user, &number, sum).await.expect("Error withdrawing points");
}

#[when("the synchronizer is stopped")]
async fn stop_synchronizer(world: &mut LoyaltyWorld) {
    world.system().service.stop().await.expect("Error stopping the synchronizer");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut LoyaltyWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then("the registration succeeds")]
async fn registration_succeeds(world: &mut LoyaltyWorld) {
    let result = world.last_result.take().expect("No order was registered");
    assert!(result.is_ok(), "Registration failed: {result:?}");
}

#[then(expr = "the registration fails because {string}")]
async fn registration_fails(world: &mut LoyaltyWorld, reason: String) {
    let result = world.last_result.take().expect("No order was registered");
    let matched = match (&result, reason.as_str()) {
        (Err(OrderApiError::InvalidFormat(_)), "the request is malformed") => true,
        (Err(OrderApiError::WrongNumberOfOrder(_)), "the order number is wrong") => true,
        (Err(OrderApiError::UploadedByYouAlready(_)), "it was uploaded already") => true,
        (Err(OrderApiError::Duplicate(_)), "it belongs to someone else") => true,
        _ => false,
    };
    assert!(matched, "Expected registration to fail because {reason}, got {result:?}");
}

#[then(expr = "'{word}' has {int} order(s)")]
async fn order_count(world: &mut LoyaltyWorld, user: String, count: usize) {
    let orders = world.orders(&user).await;
    assert_eq!(orders.len(), count, "{user} has {} orders", orders.len());
}

#[then(expr = "order {word} of '{word}' is {word}")]
async fn order_status(world: &mut LoyaltyWorld, number: String, user: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid order status");
    let order = world.order(&user, &number).await.expect("Order not found");
    assert_eq!(order.status, expected);
}

#[then(expr = "order {word} of '{word}' becomes {word} within {int}ms")]
async fn order_becomes(world: &mut LoyaltyWorld, number: String, user: String, status: String, ms: u64) {
    let expected = status.parse::<OrderStatusType>().expect("Invalid order status");
    let deadline = Instant::now() + Duration::from_millis(ms);
    loop {
        let order = world.order(&user, &number).await.expect("Order not found");
        if order.status == expected {
            break;
        }
        assert!(Instant::now() < deadline, "Order {number} is still {} after {ms}ms", order.status);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[then(expr = "order {word} of '{word}' accrued {float} points")]
async fn order_accrual(world: &mut LoyaltyWorld, number: String, user: String, points: f64) {
    let expected = Points::from_f64(points).expect("Invalid points amount");
    let order = world.order(&user, &number).await.expect("Order not found");
    assert_eq!(order.accrual, Some(expected));
}

#[then(expr = "order {word} of '{word}' has no accrual")]
async fn order_without_accrual(world: &mut LoyaltyWorld, number: String, user: String) {
    let order = world.order(&user, &number).await.expect("Order not found");
    assert_eq!(order.accrual, None);
}

#[then(expr = "'{word}' has a balance of {float} points")]
async fn balance(world: &mut LoyaltyWorld, user: String, points: f64) {
    let expected = Points::from_f64(points).expect("Invalid points amount");
    let balance = world.system().ledger.balance(&user).await.expect("Error fetching balance");
    assert_eq!(balance.current, expected);
}

#[then(expr = "'{word}' has withdrawn {float} points")]
async fn withdrawn(world: &mut LoyaltyWorld, user: String, points: f64) {
    let expected = Points::from_f64(points).expect("Invalid points amount");
    let balance = world.system().ledger.balance(&user).await.expect("Error fetching balance");
    assert_eq!(balance.withdrawn, expected);
}

#[then(expr = "the accrual service was asked about order {word} {int} time(s)")]
async fn accrual_calls(world: &mut LoyaltyWorld, number: String, count: usize) {
    let calls = world.system().client.calls_for(&number.as_str().into());
    assert_eq!(calls.len(), count);
}
