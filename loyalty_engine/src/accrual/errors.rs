use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccrualClientError {
    #[error("Invalid accrual service address: {0}")]
    InvalidUrl(String),
    #[error("Could not create the HTTP client: {0}")]
    InitializationError(#[from] reqwest::Error),
}

impl From<url::ParseError> for AccrualClientError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}
