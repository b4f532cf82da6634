//! Comparer application: configuration, effect runner and the HTTP server.
pub mod config;
mod effects;
mod render;
mod server;

use std::sync::Arc;

use comparer_engine::{EngineComponents, ReqwestSessionClient};
use comparer_logging::{cmp_info, cmp_warn};

pub use config::{AppConfig, ConfigError, DEFAULT_BIND};
pub use effects::{forward_engine_events, map_event, EffectRunner};
pub use render::escape;
pub use server::{build_router, ServerState};

/// Serves the comparison UI until Ctrl-C.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let components = EngineComponents::http(&config.engine)?;
    let sessions = ReqwestSessionClient::new(
        config.session_service_url.clone(),
        config.engine.http.request_timeout,
    )?;
    let state = ServerState::new(&config, components, Arc::new(sessions));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    cmp_info!("Comparer listening on http://{}", config.bind);
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    cmp_info!("Comparer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        cmp_warn!("Failed to listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
