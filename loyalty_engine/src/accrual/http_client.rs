use std::time::Duration;

use log::*;
use reqwest::{
    header::{HeaderValue, RETRY_AFTER},
    Client,
    StatusCode,
};
use url::Url;

use crate::{
    accrual::{AccrualClient, AccrualClientError, AccrualInfo, AccrualResponse},
    db_types::OrderNumber,
};

/// [`AccrualClient`] for the accrual service's REST API: `GET {base}/orders/{number}`.
#[derive(Debug, Clone)]
pub struct HttpAccrualClient {
    client: Client,
    base_url: Url,
    default_pause: Duration,
}

impl HttpAccrualClient {
    /// Creates a client for the service at `base_url`. Every request times out after `timeout`. A rate-limit response
    /// without a usable `Retry-After` header backs off for `default_pause`.
    pub fn new(base_url: &str, timeout: Duration, default_pause: Duration) -> Result<Self, AccrualClientError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AccrualClientError::InvalidUrl(format!("{base_url} cannot be used as a base URL")));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url, default_pause })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn order_url(&self, number: &OrderNumber) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("orders").push(number.as_str());
        }
        url
    }

    fn retry_after(&self, header: Option<&HeaderValue>) -> Duration {
        header
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(self.default_pause)
    }
}

impl AccrualClient for HttpAccrualClient {
    async fn check(&self, number: &OrderNumber) -> AccrualResponse {
        let url = self.order_url(number);
        trace!("🔄️ [{number}] GET {url}");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return AccrualResponse::OtherFailure(format!("Request failed: {e}")),
        };
        match response.status() {
            StatusCode::OK => match response.json::<AccrualInfo>().await {
                Ok(info) => info.into_response(),
                Err(e) => AccrualResponse::OtherFailure(format!("Malformed response body: {e}")),
            },
            StatusCode::NO_CONTENT => AccrualResponse::NotFoundYet,
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = self.retry_after(response.headers().get(RETRY_AFTER));
                AccrualResponse::RateLimited { retry_after }
            },
            status => AccrualResponse::OtherFailure(format!("Unexpected response status {status}")),
        }
    }
}
