use std::future::Future;

/// The base trait for loyalty engine backends.
///
/// Backends are cloned into every worker of the accrual synchronizer, so cloning should be cheap (e.g. a handle to a
/// connection pool).
pub trait LoyaltyDatabase: Clone + Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection.
    fn close(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
