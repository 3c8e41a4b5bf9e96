use std::sync::Arc;

use crate::config::Config;
use crate::interview::persona::PersonaCatalog;
use crate::interview::registry::SessionRegistry;
use crate::llm_client::CompletionClientFactory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Read-only persona catalog, built once at startup.
    pub catalog: Arc<PersonaCatalog>,
    pub sessions: Arc<SessionRegistry>,
    /// Builds a completion client bound to the caller's API key.
    /// Default: OpenRouterClientFactory. Tests inject a stub.
    pub llm: Arc<dyn CompletionClientFactory>,
}
