//! Comparer engine: viewer lifecycle, measurement harness and session plumbing.
mod auth;
mod engine;
mod harness;
mod http_viewer;
mod pdf_scan;
mod poll;
mod probe;
mod profile;
mod session;
mod settings;
mod timing;
mod types;
mod viewer;

pub use auth::{issue_document_token, normalize_server_url, AuthError, AuthGrant, AuthRequest};
pub use engine::{EngineComponents, EngineHandle};
pub use harness::{ChannelEventSink, EventSink, Harness};
pub use http_viewer::{HttpDocument, HttpViewer};
pub use pdf_scan::{linearized_page_count, page_count};
pub use poll::{wait_fully_loaded, PollOutcome};
pub use probe::{ProbeError, ReqwestProbe, ResourceHeaders, ResourceProbe};
pub use profile::{profile_for, ContainerId, DocumentSource, ProfileError, ViewerConfig};
pub use session::{
    ReqwestSessionClient, SessionClient, SessionError, DEFAULT_SESSION_SERVICE_URL, SESSION_TTL,
};
pub use settings::{
    DocumentEngineSettings, DocumentSettings, EngineConfig, HarnessSettings, HttpSettings,
    ProxyCredentials, LINEARIZED_DOCUMENT_URL, STANDARD_DOCUMENT_URL,
};
pub use timing::{
    file_name_of, log_network_summary, matching_entries, summarize_network, NetworkSummary,
    ResourceTiming, ResourceTimingSource, TimingRecorder,
};
pub use types::{EngineEvent, EventKind};
pub use viewer::{is_same_instance, Viewer, ViewerError, ViewerInstance};
