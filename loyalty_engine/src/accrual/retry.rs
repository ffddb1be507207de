//! What a check worker does next, given the accrual service's answer.
//!
//! | response                 | action                                   | attempts    |
//! |--------------------------|------------------------------------------|-------------|
//! | Success (Processed)      | submit Processed, stop                   | unchanged   |
//! | Success (Invalid)        | submit Invalid, stop                     | unchanged   |
//! | Success (Processing)     | submit Processing, poll again after delay| unchanged   |
//! | NotFoundYet, budget left | poll again after delay                   | one less    |
//! | NotFoundYet, exhausted   | submit Invalid, stop                     | zero        |
//! | RateLimited              | raise the rate-limit gate, poll again    | unchanged   |
//! | OtherFailure             | poll again after delay                   | unchanged   |
use std::time::Duration;

use loyalty_common::Points;

use crate::{accrual::AccrualResponse, db_types::OrderStatusType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between two polls of the same order
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Submit the final status and release the order
    Complete { status: OrderStatusType, accrual: Points },
    /// Submit an intermediate status and poll again after `delay`
    UpdateAndRetry { status: OrderStatusType, accrual: Points, delay: Duration },
    /// Poll again after `delay`
    Retry(Duration),
    /// Close the rate-limit gate for the given duration, then poll again once it opens
    Throttle(Duration),
}

/// Decides the next step for a job with `attempts_remaining` attempts left. Returns the action and the attempts that
/// remain afterwards.
pub fn next_action(response: &AccrualResponse, attempts_remaining: u32, policy: &RetryPolicy) -> (Action, u32) {
    match response {
        AccrualResponse::Success { status, accrual } if status.is_terminal() => {
            (Action::Complete { status: *status, accrual: *accrual }, attempts_remaining)
        },
        AccrualResponse::Success { accrual, .. } => {
            let action =
                Action::UpdateAndRetry { status: OrderStatusType::Processing, accrual: *accrual, delay: policy.retry_delay };
            (action, attempts_remaining)
        },
        AccrualResponse::NotFoundYet => match attempts_remaining.saturating_sub(1) {
            0 => (Action::Complete { status: OrderStatusType::Invalid, accrual: Points::default() }, 0),
            remaining => (Action::Retry(policy.retry_delay), remaining),
        },
        AccrualResponse::RateLimited { retry_after } => (Action::Throttle(*retry_after), attempts_remaining),
        AccrualResponse::OtherFailure(_) => (Action::Retry(policy.retry_delay), attempts_remaining),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy { retry_delay: Duration::from_secs(10) };

    fn success(status: OrderStatusType, hundredths: i64) -> AccrualResponse {
        AccrualResponse::Success { status, accrual: Points::from_hundredths(hundredths) }
    }

    #[test]
    fn terminal_answers_complete_the_job() {
        let (action, left) = next_action(&success(OrderStatusType::Processed, 3750), 2, &POLICY);
        assert_eq!(action, Action::Complete {
            status: OrderStatusType::Processed,
            accrual: Points::from_hundredths(3750)
        });
        assert_eq!(left, 2);
        let (action, left) = next_action(&success(OrderStatusType::Invalid, 0), 1, &POLICY);
        assert_eq!(action, Action::Complete { status: OrderStatusType::Invalid, accrual: Points::default() });
        assert_eq!(left, 1);
    }

    #[test]
    fn processing_is_reported_and_polled_again() {
        let (action, left) = next_action(&success(OrderStatusType::Processing, 0), 2, &POLICY);
        assert_eq!(action, Action::UpdateAndRetry {
            status: OrderStatusType::Processing,
            accrual: Points::default(),
            delay: POLICY.retry_delay
        });
        assert_eq!(left, 2);
    }

    #[test]
    fn only_unknown_orders_use_up_attempts() {
        let (action, left) = next_action(&AccrualResponse::NotFoundYet, 2, &POLICY);
        assert_eq!((action, left), (Action::Retry(POLICY.retry_delay), 1));
        let (action, left) = next_action(&AccrualResponse::NotFoundYet, 1, &POLICY);
        assert_eq!(action, Action::Complete { status: OrderStatusType::Invalid, accrual: Points::default() });
        assert_eq!(left, 0);

        let limited = AccrualResponse::RateLimited { retry_after: Duration::from_secs(5) };
        assert_eq!(next_action(&limited, 1, &POLICY), (Action::Throttle(Duration::from_secs(5)), 1));
        let failure = AccrualResponse::OtherFailure("connection refused".into());
        assert_eq!(next_action(&failure, 1, &POLICY), (Action::Retry(POLICY.retry_delay), 1));
    }

    #[test]
    fn budget_of_two_allows_exactly_two_lookups() {
        let mut attempts = 2;
        let mut lookups = 0;
        loop {
            lookups += 1;
            let (action, left) = next_action(&AccrualResponse::NotFoundYet, attempts, &POLICY);
            attempts = left;
            if let Action::Complete { status, .. } = action {
                assert_eq!(status, OrderStatusType::Invalid);
                break;
            }
        }
        assert_eq!(lookups, 2);
    }
}
