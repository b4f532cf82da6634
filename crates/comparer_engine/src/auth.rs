//! Credential proxy: exchanges server-side credentials for a document session token.

use comparer_logging::{cmp_error, cmp_info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProxyCredentials, SessionClient, SessionError};

/// Body of a token request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[serde(default)]
    pub document_id: Option<String>,
}

/// What the caller needs to open a server-hosted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    pub jwt: String,
    /// Always ends with `/`.
    pub server_url: String,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Document Engine is not configured")]
    Configuration { details: String },
    #[error("{message}")]
    Validation { message: String },
    #[error("Failed to create session")]
    Upstream { status: u16, body: String },
    #[error("Internal server error")]
    Internal { details: String },
}

impl AuthError {
    /// HTTP status the proxy answers with.
    pub fn status(&self) -> u16 {
        match self {
            AuthError::Configuration { .. } | AuthError::Internal { .. } => 500,
            AuthError::Validation { .. } => 400,
            AuthError::Upstream { status, .. } => *status,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            AuthError::Configuration { details } | AuthError::Internal { details } => Some(details),
            AuthError::Upstream { body, .. } => Some(body),
            AuthError::Validation { .. } => None,
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Upstream { status, body } => AuthError::Upstream { status, body },
            other => AuthError::Internal {
                details: other.to_string(),
            },
        }
    }
}

pub fn normalize_server_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Single attempt, no retry. Configuration is checked before the request body.
pub async fn issue_document_token(
    credentials: &ProxyCredentials,
    sessions: &dyn SessionClient,
    request: AuthRequest,
) -> Result<AuthGrant, AuthError> {
    let server_url = present(credentials.server_url.as_deref());
    let api_key = present(credentials.api_key.as_deref());
    let (Some(server_url), Some(api_key)) = (server_url, api_key) else {
        cmp_error!("Missing Document Engine credentials");
        return Err(AuthError::Configuration {
            details: "Missing DOCUMENT_ENGINE_SERVER_URL or DOCUMENT_ENGINE_API_KEY".to_string(),
        });
    };

    let Some(document_id) = present(request.document_id.as_deref()) else {
        return Err(AuthError::Validation {
            message: "documentId is required".to_string(),
        });
    };

    cmp_info!("Requesting session token for document {document_id}");
    let jwt = sessions.create_session(api_key, document_id).await?;

    Ok(AuthGrant {
        jwt,
        server_url: normalize_server_url(server_url),
        document_id: document_id.to_string(),
    })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_added_once() {
        assert_eq!(normalize_server_url("https://e.example.com"), "https://e.example.com/");
        assert_eq!(normalize_server_url("https://e.example.com/"), "https://e.example.com/");
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        let config = AuthError::Configuration { details: String::new() };
        let validation = AuthError::Validation { message: "documentId is required".into() };
        let upstream = AuthError::Upstream { status: 401, body: "nope".into() };
        assert_eq!(config.status(), 500);
        assert_eq!(validation.status(), 400);
        assert_eq!(upstream.status(), 401);
        assert_eq!(upstream.to_string(), "Failed to create session");
    }

    #[test]
    fn network_failures_become_internal_errors() {
        let err: AuthError = SessionError::Network("connection refused".into()).into();
        assert_eq!(err.status(), 500);
    }
}
