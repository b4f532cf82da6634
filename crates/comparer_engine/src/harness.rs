use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use comparer_core::{LoadingMethod, RunId};
use comparer_logging::{cmp_debug, cmp_error, cmp_info, cmp_warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    log_network_summary, profile_for, wait_fully_loaded, ContainerId, DocumentSettings,
    EngineComponents, EngineEvent, EventKind, PollOutcome, ViewerError, ViewerInstance,
};

const VIEWER_NOT_LOADED: &str = "Viewer not loaded";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs one load-and-measure chain per selected method.
///
/// Each `start` gets a fresh cancellation token; every method chain holds a
/// child of it and checks it before emitting or registering anything.
/// `reset` cancels the token and unloads every registered instance.
#[derive(Clone)]
pub struct Harness {
    shared: Arc<Shared>,
}

struct Shared {
    components: EngineComponents,
    sink: Arc<dyn EventSink>,
    registry: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    token: CancellationToken,
    instances: HashMap<ContainerId, Arc<dyn ViewerInstance>>,
}

impl Harness {
    pub fn new(components: EngineComponents, sink: Arc<dyn EventSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                components,
                sink,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Spawns the chains for `methods`. Must be called inside a tokio runtime.
    pub fn start(&self, run_id: RunId, methods: &[LoadingMethod], documents: DocumentSettings) {
        let run_token = match self.shared.registry.lock() {
            Ok(mut registry) => {
                registry.token.cancel();
                registry.token = CancellationToken::new();
                registry.token.clone()
            }
            Err(_) => {
                cmp_error!("Harness registry poisoned; run {run_id} not started");
                return;
            }
        };
        self.shared.components.timings.clear();

        cmp_info!("Starting run {run_id} with {} method(s)", methods.len());
        let documents = Arc::new(documents);
        for &method in methods {
            let chain = MethodChain {
                shared: self.shared.clone(),
                run_id,
                method,
                container: ContainerId::for_method(method),
                documents: documents.clone(),
                token: run_token.child_token(),
            };
            tokio::spawn(chain.run());
        }
    }

    /// Cancels the current run and unloads every registered instance.
    /// Unload failures are logged and swallowed.
    pub async fn reset(&self) {
        let instances: Vec<(ContainerId, Arc<dyn ViewerInstance>)> = match self.shared.registry.lock() {
            Ok(mut registry) => {
                // Cancel under the lock so no chain registers after the drain.
                registry.token.cancel();
                registry.token = CancellationToken::new();
                registry.instances.drain().collect()
            }
            Err(_) => Vec::new(),
        };

        let Some(viewer) = self.shared.components.viewer.clone() else {
            return;
        };
        for (container, instance) in instances {
            if let Err(err) = viewer.unload(container, instance.as_ref()).await {
                cmp_warn!("Error unloading {container}: {err}");
            }
        }
        cmp_debug!("Harness reset");
    }

    pub fn loaded_containers(&self) -> Vec<ContainerId> {
        self.shared
            .registry
            .lock()
            .map(|registry| registry.instances.keys().copied().collect())
            .unwrap_or_default()
    }
}

struct MethodChain {
    shared: Arc<Shared>,
    run_id: RunId,
    method: LoadingMethod,
    container: ContainerId,
    documents: Arc<DocumentSettings>,
    token: CancellationToken,
}

impl MethodChain {
    fn emit(&self, kind: EventKind) {
        if self.token.is_cancelled() {
            return;
        }
        self.shared.sink.emit(EngineEvent {
            run_id: self.run_id,
            method: self.method,
            kind,
        });
    }

    fn fail(&self, message: String) {
        self.emit(EventKind::Failed { message });
    }

    async fn run(self) {
        let method = self.method;
        let started = Instant::now();
        self.emit(EventKind::Started {
            start_time: started.into_std(),
        });

        let Some(viewer) = self.shared.components.viewer.clone() else {
            cmp_error!("[{method}] {VIEWER_NOT_LOADED}");
            self.fail(VIEWER_NOT_LOADED.to_string());
            return;
        };

        if let Some(previous) = self.take_registered() {
            if let Err(err) = viewer.unload(self.container, previous.as_ref()).await {
                cmp_warn!("[{method}] Error unloading previous instance: {err}");
            }
        }

        let config = match profile_for(method, self.container, &self.documents) {
            Ok(config) => config,
            Err(err) => {
                cmp_error!("[{method}] {err}");
                self.fail(err.to_string());
                return;
            }
        };

        cmp_info!("[{method}] Loading into {}", self.container);
        let instance = match viewer.load(&config, &self.token).await {
            Ok(instance) => instance,
            Err(ViewerError::Cancelled) => {
                cmp_debug!("[{method}] Load discarded after cancellation");
                return;
            }
            Err(err) => {
                cmp_error!("[{method}] Failed to load document: {err}");
                self.fail(err.to_string());
                return;
            }
        };

        if !self.register(instance.clone()) {
            // Only this chain's own instance is unmounted; a newer run may
            // already occupy the container.
            if let Err(err) = viewer.unload(self.container, instance.as_ref()).await {
                cmp_debug!("[{method}] Cancelled instance already replaced: {err}");
            }
            return;
        }

        let elapsed = started.elapsed();
        cmp_info!("[{method}] First render: {:.2}s", elapsed.as_secs_f64());
        self.emit(EventKind::FirstRender { elapsed });
        log_document_info(method, instance.as_ref()).await;

        let resource_url = config.resource_url().map(str::to_string);
        tokio::join!(
            self.watch_full_load(instance.as_ref(), started),
            self.measure_resource(resource_url.as_deref()),
        );
    }

    fn take_registered(&self) -> Option<Arc<dyn ViewerInstance>> {
        self.shared
            .registry
            .lock()
            .ok()
            .and_then(|mut registry| registry.instances.remove(&self.container))
    }

    /// Registers the instance unless the run was cancelled while it loaded.
    fn register(&self, instance: Arc<dyn ViewerInstance>) -> bool {
        let Ok(mut registry) = self.shared.registry.lock() else {
            return false;
        };
        if self.token.is_cancelled() {
            return false;
        }
        registry.instances.insert(self.container, instance);
        true
    }

    async fn watch_full_load(&self, instance: &dyn ViewerInstance, started: Instant) {
        let method = self.method;
        let settings = &self.shared.components.settings;
        match wait_fully_loaded(instance, settings.poll_interval, settings.poll_ceiling, &self.token).await {
            PollOutcome::Loaded { page_count, .. } => {
                let elapsed = started.elapsed();
                cmp_info!(
                    "[{method}] Fully loaded: {:.2}s ({page_count} pages)",
                    elapsed.as_secs_f64()
                );
                self.emit(EventKind::FullyLoaded { elapsed });
            }
            PollOutcome::TimedOut => {
                cmp_warn!("[{method}] Document did not finish loading within {:?}", settings.poll_ceiling);
            }
            PollOutcome::Cancelled => {}
        }
    }

    /// HEAD probe for the file size, then the network summary once the
    /// timing buffer has settled. Server-hosted documents are skipped.
    async fn measure_resource(&self, url: Option<&str>) {
        let method = self.method;
        let Some(url) = url else {
            return;
        };
        let components = &self.shared.components;

        match components.probe.head(url).await {
            Ok(headers) => {
                cmp_info!(
                    "[{method}] Server response headers: content-length={:?} accept-ranges={:?} content-type={:?} supportsRangeRequests={}",
                    headers.content_length,
                    headers.accept_ranges,
                    headers.content_type,
                    headers.supports_range_requests()
                );
                if let Some(bytes) = headers.content_length {
                    self.emit(EventKind::FileSize { bytes });
                }
            }
            Err(err) => cmp_warn!("[{method}] Could not fetch file size: {err}"),
        }

        tokio::select! {
            _ = self.token.cancelled() => return,
            _ = time::sleep(components.settings.settle_delay) => {}
        }
        log_network_summary(method, url, components.timings.as_ref());
    }
}

async fn log_document_info(method: LoadingMethod, instance: &dyn ViewerInstance) {
    match instance.total_page_count().await {
        Ok(Some(pages)) => cmp_info!("[{method}] Document info: {pages} pages"),
        Ok(None) => cmp_debug!("[{method}] Page count not available yet"),
        Err(err) => cmp_warn!("[{method}] Could not read page count: {err}"),
    }
    match instance.export_pdf().await {
        Ok(bytes) => cmp_info!("[{method}] Exported document: {} bytes", bytes.len()),
        Err(err) => cmp_debug!("[{method}] Export not available yet: {err}"),
    }
}
