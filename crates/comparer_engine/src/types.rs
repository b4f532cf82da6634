use std::time::{Duration, Instant};

use comparer_core::{LoadingMethod, RunId};

/// Progress reported by one method's load chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub run_id: RunId,
    pub method: LoadingMethod,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Started { start_time: Instant },
    FirstRender { elapsed: Duration },
    FullyLoaded { elapsed: Duration },
    FileSize { bytes: u64 },
    Failed { message: String },
}
