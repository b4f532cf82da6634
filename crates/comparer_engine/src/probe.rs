use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_TYPE};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
}

/// Headers of interest from a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceHeaders {
    pub content_length: Option<u64>,
    pub accept_ranges: Option<String>,
    pub content_type: Option<String>,
}

impl ResourceHeaders {
    pub fn supports_range_requests(&self) -> bool {
        self.accept_ranges
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("bytes"))
    }
}

#[async_trait]
pub trait ResourceProbe: Send + Sync {
    async fn head(&self, url: &str) -> Result<ResourceHeaders, ProbeError>;
}

/// Header-only probe over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ProbeError::Network(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceProbe for ReqwestProbe {
    async fn head(&self, url: &str) -> Result<ResourceHeaders, ProbeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| ProbeError::InvalidUrl(err.to_string()))?;
        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|err| ProbeError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status.as_u16()));
        }

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        Ok(ResourceHeaders {
            content_length: header(CONTENT_LENGTH).and_then(|value| value.trim().parse().ok()),
            accept_ranges: header(ACCEPT_RANGES),
            content_type: header(CONTENT_TYPE),
        })
    }
}
