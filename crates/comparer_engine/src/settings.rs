use std::time::Duration;

/// Non-linearized sample document.
pub const STANDARD_DOCUMENT_URL: &str =
    "https://public-solutions-engineering-bucket.s3.eu-central-1.amazonaws.com/docs/cartographic-perpectives.pdf";

/// Linearized sample document.
pub const LINEARIZED_DOCUMENT_URL: &str =
    "https://public-solutions-engineering-bucket.s3.eu-central-1.amazonaws.com/docs/cartographic-perspectives-linearized.pdf";

/// Pre-provisioned credentials for the server-hosted method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentEngineSettings {
    pub server_url: Option<String>,
    pub document_id: Option<String>,
    pub jwt: Option<String>,
}

/// What each method loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSettings {
    pub standard_url: String,
    pub linearized_url: String,
    pub license_key: Option<String>,
    pub document_engine: DocumentEngineSettings,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            standard_url: STANDARD_DOCUMENT_URL.to_string(),
            linearized_url: LINEARIZED_DOCUMENT_URL.to_string(),
            license_key: None,
            document_engine: DocumentEngineSettings::default(),
        }
    }
}

/// Server-side credentials used to mint session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyCredentials {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Gap between fully-loaded checks.
    pub poll_interval: Duration,
    /// Give up on fully-loaded detection after this long.
    pub poll_ceiling: Duration,
    /// Wait before aggregating resource timings.
    pub settle_delay: Duration,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            poll_ceiling: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Bytes requested up front for progressive loading.
    pub head_chunk_bytes: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            head_chunk_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub http: HttpSettings,
    pub harness: HarnessSettings,
}
