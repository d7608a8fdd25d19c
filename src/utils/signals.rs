//! Signal handling for graceful shutdown

use anyhow::Context;
use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::info;

/// Resolve once SIGTERM or SIGINT arrives, returning the signal number
pub async fn shutdown_signal() -> anyhow::Result<i32> {
    let mut signals = Signals::new([SIGTERM, SIGINT])
        .context("Failed to register shutdown signal handlers")?;
    let handle = signals.handle();

    let signal = signals
        .next()
        .await
        .context("Signal stream closed before any signal arrived")?;
    info!("Received signal: {}", signal);

    handle.close();
    Ok(signal)
}
