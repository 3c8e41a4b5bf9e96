mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::persona::PersonaCatalog;
use crate::interview::registry::SessionRegistry;
use crate::llm_client::OpenRouterClientFactory;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Arc::new(PersonaCatalog::builtin());
    info!(
        "Persona catalog loaded: {} personas ({})",
        catalog.len(),
        catalog.ids().collect::<Vec<_>>().join(", ")
    );

    let llm = OpenRouterClientFactory::new(config.provider_settings())?;
    info!("LLM client factory initialized (model: {})", llm.model());

    let sessions = Arc::new(SessionRegistry::new());
    spawn_session_sweeper(
        sessions.clone(),
        config.session_ttl,
        config.session_sweep_interval,
    );
    info!(
        "Session expiry: ttl={}s, sweep every {}s",
        config.session_ttl.as_secs(),
        config.session_sweep_interval.as_secs()
    );

    let state = AppState {
        config: config.clone(),
        catalog,
        sessions,
        llm: Arc::new(llm),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically evicts sessions that were started but never ended.
fn spawn_session_sweeper(sessions: Arc<SessionRegistry>, ttl: Duration, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            sessions.sweep_expired(ttl).await;
        }
    });
}
