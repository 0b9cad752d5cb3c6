use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod store;
mod tts;

use api::routes::{create_router, AppState};
use config::{Config, DeviceChoice};
use store::PersonalityStore;
use tts::{CommandModel, Device, TtsService};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");
    let addr = config.addr().expect("Invalid address");

    tracing::info!("Personality TTS Server v{}", env!("CARGO_PKG_VERSION"));
    let store = PersonalityStore::open(config.personalities_dir.clone())
        .expect("Failed to create personalities directory");
    tracing::info!("Personalities directory: {}", store.dir().display());
    tracing::info!("Static directory: {}", config.static_dir.display());

    // Load the speech model once; every request shares it
    let device = match config.device {
        DeviceChoice::Auto => Device::detect(),
        DeviceChoice::Fixed(device) => device,
    };
    let model = CommandModel::new(&config.model_command, device)
        .expect("Failed to initialize speech model");
    tracing::info!("Speech model: {} on {}", model.program(), device);

    let tts = TtsService::new(Arc::new(model), config.max_concurrent_generations);

    let state = Arc::new(AppState {
        tts,
        store,
        static_dir: config.static_dir.clone(),
        max_upload_bytes: config.max_upload_bytes,
        max_text_chars: config.max_text_chars,
    });

    let app = create_router(Arc::clone(&state));

    tracing::info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown requested");
    state.tts.shutdown();
}
