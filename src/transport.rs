use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single GET attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    /// True for 4xx answers that will not change on retry (everything but 408 and 429).
    pub fn is_client_error(&self) -> bool {
        match self {
            TransportError::Status { status, .. } => {
                (400..500).contains(status) && *status != 408 && *status != 429
            }
            _ => false,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<Value, TransportError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> crate::error::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("arcgis-scraper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> std::result::Result<Value, TransportError> {
        log::debug!("GET {} ({} params)", url, params.len());

        let res = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(redact)?;
        let status = res.status();
        if !status.is_success() {
            // Keep tokens out of error messages.
            let mut url = res.url().clone();
            url.set_query(None);
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = res.text().await.map_err(redact)?;
        log::debug!("Response length: {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }
}

/// Drops the query string (and with it any token) from a failed request's URL.
fn redact(mut err: reqwest::Error) -> TransportError {
    if let Some(url) = err.url_mut() {
        url.set_query(None);
    }
    TransportError::Network(err)
}
