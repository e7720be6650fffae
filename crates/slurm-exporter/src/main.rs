mod adapter;
mod args;
mod collector;
mod handlers;
mod metrics;
mod source;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use slurm_common::telemetry::init_tracing;

use crate::args::Args;
use crate::handlers::router;
use crate::source::SinfoSource;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_tracing(
        "slurm-exporter",
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );

    tracing::info!(
        listen_addr=%args.listen_addr,
        sinfo_bin=%args.sinfo_bin,
        exit_on_source_failure = args.exit_on_source_failure,
        "slurm-exporter starting"
    );

    let st = AppState::new(
        Arc::new(SinfoSource::new(args.sinfo_bin)),
        args.exit_on_source_failure,
    );

    let listener = tokio::net::TcpListener::bind(&args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;

    let fatal = st.fatal.clone();
    let mut fatal_rx = fatal.subscribe();
    axum::serve(listener, router(st))
        .with_graceful_shutdown(async move {
            let _ = fatal_rx.wait_for(Option::is_some).await;
        })
        .await
        .context("http server failed")?;

    // Return rather than exit so the telemetry guard flushes the failure spans.
    if let Some(reason) = fatal.borrow().clone() {
        anyhow::bail!("stopping after node source failure: {reason}");
    }
    Ok(())
}
