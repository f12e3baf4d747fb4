//! HTTP endpoints for the zram dashboard card.
//!
//! The dashboard polls `GET /status` and posts swap management requests to
//! `POST /swap`. Handlers run the synchronous core on tokio's blocking pool;
//! management requests are serialized so only one of them touches the zram
//! pool and the settings file at a time.

#![deny(missing_docs)]
#![deny(clippy::panic)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod blocking;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use zram_card_core::{SettingsStore, ToolRunner};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";

/// Shared application state for all HTTP handlers.
pub struct AppState {
    /// Settings file shared with the CLI.
    pub settings: SettingsStore,
    /// Runner for the zram and swap tools.
    pub runner: Arc<dyn ToolRunner>,
    /// Held until every create/remove finishes on the blocking pool, even
    /// when the request that started it has gone away.
    manage_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// State over `settings`, driving tools through `runner`.
    #[must_use]
    pub fn new(settings: SettingsStore, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            settings,
            runner,
            manage_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Build the router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/config", get(handlers::config))
        .route("/swap", post(handlers::swap))
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener fails.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, settings = %state.settings.path().display(), "zram card server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("zram card server stopped");
    Ok(())
}
