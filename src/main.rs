//! Quiz Timer - A persisted, pausable countdown timer service
//!
//! This is the main entry point for the quiz-timer application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use quiz_timer::{
    api::create_router,
    config::Config,
    state::AppState,
    store::FileStore,
    tasks::countdown_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("quiz_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting quiz-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}, key={}",
        config.host, config.port, config.data_dir, config.key
    );

    // Create application state, restoring any persisted timer
    let store = Arc::new(FileStore::new(&config.data_dir));
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        store,
        config.key.clone(),
    ));

    // Start the countdown background task
    let timer_state = Arc::clone(&state);
    tokio::spawn(async move {
        countdown_task(timer_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start      - Begin a fresh quiz attempt");
    info!("  POST /pause      - Pause the countdown");
    info!("  POST /resume     - Resume a paused countdown");
    info!("  POST /stop       - Force completion of the attempt");
    info!("  POST /reset      - Clear the timer and its persisted state");
    info!("  POST /visibility - Inject the page-visibility signal");
    info!("  GET  /status     - Current snapshot and derived readouts");
    info!("  GET  /health     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Park the timer so a restart never resurrects a running countdown
    if let Err(e) = state.handle_unload() {
        warn!("Failed to park timer on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
