//! Dashboard server command.

use super::Context;
use anyhow::Context as _;
use clap::Args;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use zram_card_http::{AppState, DEFAULT_BIND};

/// Arguments for the dashboard server.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(short, long, default_value = DEFAULT_BIND)]
    pub bind: String,
}

/// Serve the dashboard endpoints until interrupted.
pub fn serve(ctx: Context, args: &ServeArgs) -> anyhow::Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let state = Arc::new(AppState::new(ctx.settings, Arc::new(ctx.runner)));
    runtime.block_on(async {
        let listener = TcpListener::bind(&args.bind)
            .await
            .with_context(|| format!("failed to bind {}", args.bind))?;
        zram_card_http::serve(listener, state, shutdown_signal()).await
    })?;

    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
