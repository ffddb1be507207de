use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Invalid request: {0}")]
    InvalidFormat(String),
    #[error("Order number {0} is not a valid order number")]
    WrongNumberOfOrder(String),
    #[error("Order {0} has been uploaded by another user")]
    Duplicate(String),
    #[error("Order {0} has already been uploaded by this user")]
    UploadedByYouAlready(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The accrual synchronizer is not running")]
    ServiceStopped,
    #[error("The accrual synchronizer is already running")]
    AlreadyStarted,
}

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Invalid request: {0}")]
    InvalidFormat(String),
    #[error("Order number {0} is not a valid order number")]
    WrongNumberOfOrder(String),
    #[error("Not enough points. Requested {requested}, but the balance is {available}")]
    NotEnoughPoints { requested: String, available: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
}
