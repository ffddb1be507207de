use std::{future::Future, time::Duration};

use loyalty_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderNumber, OrderStatusType};

/// The order status vocabulary of the accrual service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl From<AccrualStatus> for OrderStatusType {
    /// A registered order is known to the service but has not been calculated yet, which is what `Processing` means
    /// here.
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered | AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

/// The body of a successful lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualInfo {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
}

impl AccrualInfo {
    pub fn into_response(self) -> AccrualResponse {
        let accrual = match self.accrual.map(Points::from_f64).transpose() {
            Ok(v) => v.unwrap_or_default(),
            Err(e) => return AccrualResponse::OtherFailure(format!("Order {}: {e}", self.order)),
        };
        if accrual.value() < 0 {
            return AccrualResponse::OtherFailure(format!("Order {} has a negative accrual of {accrual}", self.order));
        }
        AccrualResponse::Success { status: self.status.into(), accrual }
    }
}

/// The outcome of a single lookup against the accrual service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualResponse {
    /// The service has a definitive answer for the order
    Success { status: OrderStatusType, accrual: Points },
    /// The service does not know the order (yet)
    NotFoundYet,
    /// The service is overloaded. No requests may be sent until `retry_after` has elapsed.
    RateLimited { retry_after: Duration },
    /// Network or service error
    OtherFailure(String),
}

/// A client for the external accrual service.
///
/// `check` makes exactly one request and has no other side effects. Callers abandon the returned future when they
/// shut down, so implementations must be cancel-safe.
pub trait AccrualClient: Clone + Send + Sync + 'static {
    fn check(&self, number: &OrderNumber) -> impl Future<Output = AccrualResponse> + Send;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_accrual_info() {
        let info: AccrualInfo =
            serde_json::from_str(r#"{"order": "79927398713", "status": "PROCESSED", "accrual": 37.5}"#).unwrap();
        assert_eq!(info.into_response(), AccrualResponse::Success {
            status: OrderStatusType::Processed,
            accrual: Points::from_hundredths(3750)
        });
        let info: AccrualInfo = serde_json::from_str(r#"{"order": "79927398713", "status": "REGISTERED"}"#).unwrap();
        assert_eq!(info.into_response(), AccrualResponse::Success {
            status: OrderStatusType::Processing,
            accrual: Points::default()
        });
        let info: AccrualInfo = serde_json::from_str(r#"{"order": "79927398713", "status": "INVALID"}"#).unwrap();
        assert_eq!(info.into_response(), AccrualResponse::Success {
            status: OrderStatusType::Invalid,
            accrual: Points::default()
        });
    }

    #[test]
    fn negative_accrual_is_a_failure() {
        let info = AccrualInfo { order: "0".into(), status: AccrualStatus::Processed, accrual: Some(-1.0) };
        assert!(matches!(info.into_response(), AccrualResponse::OtherFailure(_)));
        let info = AccrualInfo { order: "0".into(), status: AccrualStatus::Processed, accrual: Some(f64::NAN) };
        assert!(matches!(info.into_response(), AccrualResponse::OtherFailure(_)));
    }

    #[test]
    fn unknown_status_does_not_parse() {
        assert!(serde_json::from_str::<AccrualInfo>(r#"{"order": "0", "status": "PENDING"}"#).is_err());
    }
}
