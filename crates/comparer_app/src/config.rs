//! Application configuration: environment variables layered over an
//! optional RON file named by `COMPARER_CONFIG`.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use comparer_engine::{
    DocumentEngineSettings, DocumentSettings, EngineConfig, ProxyCredentials,
    DEFAULT_SESSION_SERVICE_URL,
};
use comparer_logging::{cmp_info, LogDestination};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

const CONFIG_FILE_VAR: &str = "COMPARER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid bind address {value:?}: {source}")]
    Bind {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid log destination {0:?} (expected terminal, file or both)")]
    LogDestination(String),
}

/// File-side settings. Every field is optional; environment variables win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    bind: Option<String>,
    log: Option<String>,
    document_engine_server_url: Option<String>,
    document_engine_api_key: Option<String>,
    document_engine_document_id: Option<String>,
    document_engine_jwt: Option<String>,
    license_key: Option<String>,
    web_sdk_version: Option<String>,
    session_service_url: Option<String>,
    standard_document_url: Option<String>,
    linearized_document_url: Option<String>,
    poll_interval_ms: Option<u64>,
    poll_ceiling_secs: Option<u64>,
    settle_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    head_chunk_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub log_destination: LogDestination,
    pub documents: DocumentSettings,
    pub proxy: ProxyCredentials,
    pub session_service_url: String,
    /// Displayed only.
    pub web_sdk_version: Option<String>,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Reads the process environment (and the file it points at).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::from_env`] with a custom variable lookup.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match non_empty(lookup(CONFIG_FILE_VAR)) {
            Some(path) => read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };
        Self::layered(&lookup, file)
    }

    /// Environment-only configuration; no file is consulted.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::layered(&lookup, FileConfig::default())
    }

    fn layered(lookup: &dyn Fn(&str) -> Option<String>, file: FileConfig) -> Result<Self, ConfigError> {
        let pick = |key: &str, fallback: Option<String>| non_empty(lookup(key)).or(non_empty(fallback));

        let bind_raw = pick("COMPARER_BIND", file.bind).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::Bind { value: bind_raw.clone(), source })?;

        let log_destination = match pick("COMPARER_LOG", file.log) {
            Some(raw) => LogDestination::parse(&raw).ok_or(ConfigError::LogDestination(raw))?,
            None => LogDestination::default(),
        };

        let server_url = pick("DOCUMENT_ENGINE_SERVER_URL", file.document_engine_server_url);
        let defaults = DocumentSettings::default();
        let documents = DocumentSettings {
            standard_url: pick("COMPARER_STANDARD_DOCUMENT_URL", file.standard_document_url)
                .unwrap_or(defaults.standard_url),
            linearized_url: pick("COMPARER_LINEARIZED_DOCUMENT_URL", file.linearized_document_url)
                .unwrap_or(defaults.linearized_url),
            license_key: pick("WEB_SDK_LICENSE_KEY", file.license_key),
            document_engine: DocumentEngineSettings {
                server_url: server_url.clone(),
                document_id: pick("DOCUMENT_ENGINE_DOCUMENT_ID", file.document_engine_document_id),
                jwt: pick("DOCUMENT_ENGINE_JWT", file.document_engine_jwt),
            },
        };

        let proxy = ProxyCredentials {
            server_url,
            api_key: pick("DOCUMENT_ENGINE_API_KEY", file.document_engine_api_key),
        };

        let mut engine = EngineConfig::default();
        if let Some(ms) = file.poll_interval_ms {
            engine.harness.poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = file.poll_ceiling_secs {
            engine.harness.poll_ceiling = Duration::from_secs(secs);
        }
        if let Some(ms) = file.settle_delay_ms {
            engine.harness.settle_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = file.request_timeout_secs {
            engine.http.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = file.head_chunk_bytes {
            engine.http.head_chunk_bytes = bytes;
        }

        Ok(Self {
            bind,
            log_destination,
            documents,
            proxy,
            session_service_url: pick("SESSION_SERVICE_URL", file.session_service_url)
                .unwrap_or_else(|| DEFAULT_SESSION_SERVICE_URL.to_string()),
            web_sdk_version: pick("WEB_SDK_VERSION", file.web_sdk_version),
            engine,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cmp_info!("Loaded configuration from {:?}", path);
    Ok(file)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
