use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::DdragonError;

/// Outbound HTTP port. The coordinator only ever needs raw bytes; parsing
/// and persistence happen behind it.
#[async_trait]
pub trait CdnClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, DdragonError>;
}

#[derive(Clone)]
pub struct CdnHttpClient {
    client: Client,
}

impl CdnHttpClient {
    pub fn new() -> Result<Self, DdragonError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ddragon-cache/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DdragonError::CdnHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| DdragonError::CdnHttp(err.to_string()))?;
        Ok(Self { client })
    }

    async fn send_with_retries(&self, url: &str) -> Result<reqwest::Response, DdragonError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(DdragonError::CdnHttp(err.to_string()));
                }
            }
        }
    }
}

#[async_trait]
impl CdnClient for CdnHttpClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, DdragonError> {
        let response = self.send_with_retries(url).await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "CDN request failed".to_string());
            return Err(DdragonError::CdnStatus { status, message });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| DdragonError::CdnHttp(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
