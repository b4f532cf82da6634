use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use comparer_logging::{cmp_debug, cmp_error};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SESSION_SERVICE_URL: &str = "https://api.nutrient.io/viewer/sessions";

/// Lifetime of an issued session token.
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

const DOCUMENT_PERMISSIONS: [&str; 3] = ["read", "write", "download"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The service answered with a non-success status.
    #[error("session service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("session service unreachable: {0}")]
    Network(String),
    #[error("invalid session response: {0}")]
    InvalidResponse(String),
}

/// Issues short-lived tokens scoped to one document.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn create_session(&self, api_key: &str, document_id: &str) -> Result<String, SessionError>;
}

#[derive(Debug, Serialize)]
struct SessionPayload<'a> {
    allowed_documents: [AllowedDocument<'a>; 1],
    exp: i64,
}

#[derive(Debug, Serialize)]
struct AllowedDocument<'a> {
    document_id: &'a str,
    document_permissions: [&'static str; 3],
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    jwt: String,
}

type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Session client talking to the hosted session service.
#[derive(Clone)]
pub struct ReqwestSessionClient {
    client: reqwest::Client,
    endpoint: String,
    clock: Clock,
}

impl ReqwestSessionClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SessionError::Network(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            clock: Arc::new(|| chrono::Utc::now().timestamp()),
        })
    }

    /// Replaces the unix-seconds clock used to compute the expiry.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn payload<'a>(&self, document_id: &'a str) -> SessionPayload<'a> {
        SessionPayload {
            allowed_documents: [AllowedDocument {
                document_id,
                document_permissions: DOCUMENT_PERMISSIONS,
            }],
            exp: (self.clock)() + SESSION_TTL.as_secs() as i64,
        }
    }
}

#[async_trait]
impl SessionClient for ReqwestSessionClient {
    async fn create_session(&self, api_key: &str, document_id: &str) -> Result<String, SessionError> {
        let body = serde_json::to_string(&self.payload(document_id))
            .map_err(|err| SessionError::InvalidResponse(err.to_string()))?;

        cmp_debug!("Requesting session token from {} for document {document_id}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.as_str())
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| SessionError::Network(err.to_string()))?;

        if !status.is_success() {
            cmp_error!("Session creation failed: {text}");
            return Err(SessionError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: SessionResponse = serde_json::from_str(&text)
            .map_err(|err| SessionError::InvalidResponse(err.to_string()))?;
        Ok(parsed.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_scopes_one_document_for_an_hour() {
        let client = ReqwestSessionClient::new(DEFAULT_SESSION_SERVICE_URL, Duration::from_secs(5))
            .unwrap()
            .with_clock(|| 1_700_000_000);
        let payload = serde_json::to_value(client.payload("doc-1")).unwrap();
        assert_eq!(
            payload,
            json!({
                "allowed_documents": [
                    { "document_id": "doc-1", "document_permissions": ["read", "write", "download"] }
                ],
                "exp": 1_700_003_600
            })
        );
    }
}
