//! Set Counter - a workout set counter with a rest countdown
//!
//! This is the main entry point for the set-counter server.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use set_counter::{
    api::create_router,
    config::Config,
    services::{JsonFileStore, KeyValueStore, MemoryStore},
    state::AppState,
    tasks::{persistence_task, session_event_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("set_counter={},tower_http=info", config.log_level()))
        .init();

    info!("Starting set-counter server v{}", env!("CARGO_PKG_VERSION"));

    let rest = config.rest_duration().context("Invalid rest timer")?;
    let total_sets = config.total_sets().context("Invalid set count")?;
    info!(
        "Configuration: host={}, port={}, rest={}m{}s, sets={}",
        config.host,
        config.port,
        rest.minutes(),
        rest.seconds(),
        total_sets
    );

    let store: Arc<dyn KeyValueStore> = if config.memory_store {
        info!("Using in-memory store, the counter will not survive restarts");
        Arc::new(MemoryStore::new())
    } else {
        let path = config.store_path();
        info!("Using store file {}", path.display());
        Arc::new(JsonFileStore::new(path))
    };

    // Create application state and load the persisted counter before serving
    let (state, events) = AppState::new(config.port, config.host.clone(), total_sets, rest);
    let state = Arc::new(state);
    let restored = state.restore(store.as_ref()).await?;
    info!("Session ready: count={}, timer={}", restored.count, restored.timer_text);

    tokio::spawn(session_event_task(Arc::clone(&state), events));
    tokio::spawn(persistence_task(Arc::clone(&store), state.persisted_counts()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /increment - Count a set and start the rest countdown");
    info!("  POST /decrement - Take back one set");
    info!("  POST /reset     - Zero the counter");
    info!("  POST /dismiss   - Close the next-set notification");
    info!("  PUT  /timer     - Set rest duration {{minutes, seconds}}");
    info!("  PUT  /sets      - Set target sets {{value}}");
    info!("  GET  /status    - Current session");
    info!("  GET  /events    - Session updates (SSE)");
    info!("  GET  /health    - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            match signal {
                Ok(signal) => info!("Shutdown signal {} received", signal),
                Err(e) => error!("Signal handling failed: {:#}", e),
            }
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
