//! HTTP surface: the two screens, their form actions, JSON state endpoints
//! and the credential proxy.

use std::sync::{Arc, Mutex, Weak};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use comparer_core::{
    loading_options, update, AppState, ComparisonViewModel, Effect, LoadingMethod, Msg, PanelView,
    Route,
};
use comparer_engine::{
    issue_document_token, AuthError, AuthGrant, AuthRequest, EngineComponents, EngineHandle,
    ProxyCredentials, SessionClient,
};
use comparer_logging::{cmp_debug, cmp_error, cmp_warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::effects::{forward_engine_events, EffectRunner};
use crate::render;

/// Shared state behind every handler.
pub struct ServerState {
    app: Mutex<AppState>,
    runner: EffectRunner,
    proxy: ProxyCredentials,
    sessions: Arc<dyn SessionClient>,
    web_sdk_version: Option<String>,
}

impl ServerState {
    /// Wires the engine and message pump. Must run inside a tokio runtime.
    pub fn new(
        config: &AppConfig,
        components: EngineComponents,
        sessions: Arc<dyn SessionClient>,
    ) -> Arc<Self> {
        let (engine, engine_events) = EngineHandle::new(components);
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_engine_events(engine_events, msg_tx.clone()));

        let runner = EffectRunner::new(
            engine,
            config.documents.clone(),
            config.proxy.clone(),
            sessions.clone(),
            msg_tx,
        );
        let state = Arc::new(Self {
            app: Mutex::new(AppState::new()),
            runner,
            proxy: config.proxy.clone(),
            sessions,
            web_sdk_version: config.web_sdk_version.clone(),
        });

        let weak: Weak<Self> = Arc::downgrade(&state);
        tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let Some(state) = weak.upgrade() else {
                    break;
                };
                state.dispatch(msg).await;
            }
        });
        state
    }

    /// Applies `msg`, runs the resulting effects and returns where to
    /// navigate, if anywhere.
    pub async fn dispatch(&self, msg: Msg) -> Option<Route> {
        let effects = self.apply(msg);
        self.runner.run(effects).await
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let Ok(mut app) = self.app.lock() else {
            cmp_error!("Application state lock poisoned");
            return Vec::new();
        };
        let (next, effects) = update(std::mem::take(&mut *app), msg);
        *app = next;
        effects
    }

    fn with_app<T>(&self, read: impl FnOnce(&mut AppState) -> T) -> Option<T> {
        self.app.lock().ok().map(|mut app| read(&mut app))
    }
}

pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(selection_handler))
        .route("/select/:method", post(toggle_handler))
        .route("/continue", post(continue_handler))
        .route("/compare", get(compare_handler))
        .route("/compare/start", post(start_handler))
        .route("/compare/reset", post(reset_handler))
        .route("/api/comparison", get(comparison_api_handler))
        .route("/api/options", get(options_api_handler))
        .route("/api/document-engine-auth", post(document_engine_auth_handler))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct MethodsQuery {
    methods: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionResponse {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PanelResponse {
    method: &'static str,
    name: &'static str,
    status: &'static str,
    badge: Option<&'static str>,
    first_render: String,
    fully_loaded: String,
    interactive: String,
    file_size: String,
    error: Option<String>,
}

impl From<&PanelView> for PanelResponse {
    fn from(panel: &PanelView) -> Self {
        Self {
            method: panel.method.as_str(),
            name: panel.name,
            status: panel.status.as_str(),
            badge: panel.status.badge(),
            first_render: panel.first_render.clone(),
            fully_loaded: panel.fully_loaded.clone(),
            interactive: panel.interactive.clone(),
            file_size: panel.file_size.clone(),
            error: panel.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonResponse {
    methods: Vec<&'static str>,
    started: bool,
    run_id: u64,
    method_count_label: String,
    grid_columns: usize,
    info_text: &'static str,
    /// Whether anything changed since the previous poll.
    changed: bool,
    panels: Vec<PanelResponse>,
}

impl ComparisonResponse {
    fn new(view: &ComparisonViewModel, methods: &[LoadingMethod]) -> Self {
        Self {
            methods: methods.iter().map(|method| method.as_str()).collect(),
            started: view.started,
            run_id: view.run_id,
            method_count_label: view.method_count_label.clone(),
            grid_columns: view.grid_columns,
            info_text: view.info_text,
            changed: view.dirty,
            panels: view.panels.iter().map(PanelResponse::from).collect(),
        }
    }
}

fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            details: Some("application state unavailable".to_string()),
        }),
    )
}

async fn selection_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MethodsQuery>,
) -> Result<Html<String>, ApiError> {
    state.dispatch(Msg::SelectionRestored(query.methods)).await;
    let view = state
        .with_app(|app| app.selection_view())
        .ok_or_else(internal_error)?;
    Ok(Html(render::selection_page(&view, state.web_sdk_version.as_deref())))
}

async fn toggle_handler(
    State(state): State<Arc<ServerState>>,
    Path(method): Path<String>,
) -> Result<Redirect, ApiError> {
    let method: LoadingMethod = method.parse().map_err(|err: comparer_core::UnknownMethod| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: err.to_string(),
                details: None,
            }),
        )
    })?;
    state.dispatch(Msg::MethodToggled(method)).await;
    let href = state
        .with_app(|app| app.selection().selection_href())
        .ok_or_else(internal_error)?;
    Ok(Redirect::to(&href))
}

async fn continue_handler(State(state): State<Arc<ServerState>>) -> Redirect {
    let route = state.dispatch(Msg::ContinueClicked).await.unwrap_or(Route::Selection);
    Redirect::to(&route.href())
}

async fn compare_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MethodsQuery>,
) -> Result<Response, ApiError> {
    if let Some(route) = state.dispatch(Msg::CompareOpened { methods: query.methods }).await {
        return Ok(Redirect::to(&route.href()).into_response());
    }
    let html = state
        .with_app(|app| {
            render::comparison_page(
                &app.comparison_view(),
                app.comparison(),
                state.web_sdk_version.as_deref(),
            )
        })
        .ok_or_else(internal_error)?;
    Ok(Html(html).into_response())
}

async fn start_handler(State(state): State<Arc<ServerState>>) -> Result<Redirect, ApiError> {
    state.dispatch(Msg::StartClicked).await;
    back_to_comparison(&state)
}

async fn reset_handler(State(state): State<Arc<ServerState>>) -> Result<Redirect, ApiError> {
    state.dispatch(Msg::ResetClicked).await;
    back_to_comparison(&state)
}

fn back_to_comparison(state: &ServerState) -> Result<Redirect, ApiError> {
    let href = state
        .with_app(|app| {
            let comparison = app.comparison();
            if comparison.is_empty() {
                Route::Selection.href()
            } else {
                comparison.compare_href()
            }
        })
        .ok_or_else(internal_error)?;
    Ok(Redirect::to(&href))
}

async fn comparison_api_handler(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    state
        .with_app(|app| {
            let response = ComparisonResponse::new(&app.comparison_view(), app.comparison().methods());
            app.consume_dirty();
            Json(response)
        })
        .ok_or_else(internal_error)
}

async fn options_api_handler() -> Json<Vec<OptionResponse>> {
    Json(
        loading_options()
            .into_iter()
            .map(|option| OptionResponse {
                id: option.id.as_str(),
                name: option.name,
                description: option.description,
                enabled: option.enabled,
            })
            .collect(),
    )
}

/// Credential proxy. An empty or malformed body counts as a missing
/// document id.
async fn document_engine_auth_handler(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<AuthGrant>, ApiError> {
    let request = if body.is_empty() {
        AuthRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|err| {
            cmp_debug!("Unreadable auth request body: {err}");
            AuthRequest::default()
        })
    };

    issue_document_token(&state.proxy, state.sessions.as_ref(), request)
        .await
        .map(Json)
        .map_err(auth_error_response)
}

fn auth_error_response(err: AuthError) -> ApiError {
    if !matches!(err, AuthError::Validation { .. }) {
        cmp_warn!("Document engine auth failed: {err}");
    }
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            details: err.details().map(str::to_string),
        }),
    )
}
