use std::sync::{Arc, Mutex};

use comparer_core::{Effect, LoadingMethod, Msg, Route, RunId, ViewerPatch};
use comparer_engine::{
    issue_document_token, AuthRequest, DocumentSettings, EngineEvent, EngineHandle, EventKind,
    ProxyCredentials, SessionClient,
};
use comparer_logging::{cmp_error, cmp_info, cmp_warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Executes core effects against the engine. Navigation is handed back to
/// the caller, which owns the HTTP response.
pub struct EffectRunner {
    engine: EngineHandle,
    documents: DocumentSettings,
    proxy: ProxyCredentials,
    sessions: Arc<dyn SessionClient>,
    msg_tx: UnboundedSender<Msg>,
    /// Replaced on every reset. A start still waiting for its session token
    /// holds a clone and gives up once it fires.
    pending_start: Mutex<CancellationToken>,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        documents: DocumentSettings,
        proxy: ProxyCredentials,
        sessions: Arc<dyn SessionClient>,
        msg_tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            engine,
            documents,
            proxy,
            sessions,
            msg_tx,
            pending_start: Mutex::new(CancellationToken::new()),
        }
    }

    /// Runs every effect in order and returns the last navigation target.
    pub async fn run(&self, effects: Vec<Effect>) -> Option<Route> {
        let mut navigate = None;
        for effect in effects {
            match effect {
                Effect::Navigate(route) => {
                    cmp_info!("Navigate to {}", route.href());
                    navigate = Some(route);
                }
                Effect::StartViewers { run_id, methods } => {
                    self.start_viewers(run_id, methods).await;
                }
                Effect::ResetViewers => {
                    cmp_info!("Resetting viewers");
                    self.cancel_pending_start();
                    self.engine.reset().await;
                }
            }
        }
        navigate
    }

    async fn start_viewers(&self, run_id: RunId, mut methods: Vec<LoadingMethod>) {
        let Some(pending) = self.pending_start.lock().ok().map(|token| token.clone()) else {
            cmp_error!("Start state poisoned; run {run_id} not started");
            return;
        };

        let mut documents = self.documents.clone();
        if methods.contains(&LoadingMethod::DocumentEngine) && documents.document_engine.jwt.is_none() {
            let acquired = tokio::select! {
                _ = pending.cancelled() => {
                    cmp_info!("Run {run_id} reset while fetching a session token");
                    return;
                }
                acquired = self.acquire_token(&mut documents) => acquired,
            };
            if let Err(message) = acquired {
                cmp_warn!("[{}] {message}", LoadingMethod::DocumentEngine);
                self.send(Msg::ViewerUpdated {
                    run_id,
                    method: LoadingMethod::DocumentEngine,
                    patch: ViewerPatch::failed(message),
                });
                methods.retain(|method| *method != LoadingMethod::DocumentEngine);
            }
        }

        // Resets cancel under this lock, so a run is either started before
        // the reset reaches the engine or not at all.
        let Ok(_current) = self.pending_start.lock() else {
            cmp_error!("Start state poisoned; run {run_id} not started");
            return;
        };
        if pending.is_cancelled() {
            cmp_info!("Run {run_id} was reset before its viewers started");
            return;
        }
        cmp_info!("Starting run {run_id}: {:?}", methods);
        self.engine.start(run_id, &methods, documents);
    }

    fn cancel_pending_start(&self) {
        if let Ok(mut pending) = self.pending_start.lock() {
            pending.cancel();
            *pending = CancellationToken::new();
        }
    }

    /// Fetches a session token through the credential proxy when only a
    /// document id is configured.
    async fn acquire_token(&self, documents: &mut DocumentSettings) -> Result<(), String> {
        let Some(document_id) = documents.document_engine.document_id.clone() else {
            // Let the profile report exactly what is missing.
            return Ok(());
        };
        let request = AuthRequest {
            document_id: Some(document_id),
        };
        match issue_document_token(&self.proxy, self.sessions.as_ref(), request).await {
            Ok(grant) => {
                documents.document_engine.server_url = Some(grant.server_url);
                documents.document_engine.jwt = Some(grant.jwt);
                Ok(())
            }
            Err(err) => Err(match err.details() {
                Some(details) => format!("Failed to obtain session token: {err} ({details})"),
                None => format!("Failed to obtain session token: {err}"),
            }),
        }
    }

    fn send(&self, msg: Msg) {
        let _ = self.msg_tx.send(msg);
    }
}

/// Forwards engine events into the message queue until either side closes.
pub async fn forward_engine_events(
    mut events: UnboundedReceiver<EngineEvent>,
    msg_tx: UnboundedSender<Msg>,
) {
    while let Some(event) = events.recv().await {
        if msg_tx.send(map_event(event)).is_err() {
            break;
        }
    }
}

pub fn map_event(event: EngineEvent) -> Msg {
    let patch = match event.kind {
        EventKind::Started { start_time } => ViewerPatch::started(start_time),
        EventKind::FirstRender { elapsed } => ViewerPatch::first_render(elapsed),
        EventKind::FullyLoaded { elapsed } => ViewerPatch::fully_loaded(elapsed),
        EventKind::FileSize { bytes } => ViewerPatch::file_size(bytes),
        EventKind::Failed { message } => ViewerPatch::failed(message),
    };
    Msg::ViewerUpdated {
        run_id: event.run_id,
        method: event.method,
        patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn engine_events_become_viewer_patches() {
        let msg = map_event(EngineEvent {
            run_id: 3,
            method: LoadingMethod::Linearized,
            kind: EventKind::FirstRender {
                elapsed: Duration::from_millis(1250),
            },
        });
        assert_eq!(
            msg,
            Msg::ViewerUpdated {
                run_id: 3,
                method: LoadingMethod::Linearized,
                patch: ViewerPatch::first_render(Duration::from_millis(1250)),
            }
        );
    }
}
