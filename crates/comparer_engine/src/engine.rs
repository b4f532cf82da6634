use std::sync::Arc;

use comparer_core::{LoadingMethod, RunId};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::harness::{ChannelEventSink, Harness};
use crate::{
    DocumentSettings, EngineConfig, EngineEvent, HarnessSettings, HttpViewer, ReqwestProbe,
    ResourceProbe, TimingRecorder, Viewer, ViewerError,
};

/// Capabilities the harness drives. `viewer` is `None` when no viewer is
/// installed, in which case every method fails with "Viewer not loaded".
#[derive(Clone)]
pub struct EngineComponents {
    pub viewer: Option<Arc<dyn Viewer>>,
    pub probe: Arc<dyn ResourceProbe>,
    pub timings: Arc<TimingRecorder>,
    pub settings: HarnessSettings,
}

impl EngineComponents {
    /// HTTP viewer and HEAD probe sharing one timing recorder.
    pub fn http(config: &EngineConfig) -> Result<Self, ViewerError> {
        let timings = Arc::new(TimingRecorder::new());
        let viewer = HttpViewer::new(&config.http, timings.clone())?;
        let probe = ReqwestProbe::new(config.http.request_timeout)
            .map_err(|err| ViewerError::Network(err.to_string()))?;
        Ok(Self {
            viewer: Some(Arc::new(viewer)),
            probe: Arc::new(probe),
            timings,
            settings: config.harness.clone(),
        })
    }
}

pub struct EngineHandle {
    harness: Harness,
}

impl EngineHandle {
    pub fn new(components: EngineComponents) -> (Self, UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let sink = Arc::new(ChannelEventSink::new(event_tx));
        let harness = Harness::new(components, sink);
        (Self { harness }, event_rx)
    }

    pub fn with_http(config: &EngineConfig) -> Result<(Self, UnboundedReceiver<EngineEvent>), ViewerError> {
        Ok(Self::new(EngineComponents::http(config)?))
    }

    pub fn start(&self, run_id: RunId, methods: &[LoadingMethod], documents: DocumentSettings) {
        self.harness.start(run_id, methods, documents);
    }

    pub async fn reset(&self) {
        self.harness.reset().await;
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }
}
