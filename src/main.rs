use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quipduel::{
    api, config::GameConfig, prompts::PromptPool, state::AppState, transport::BridgeTransport,
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quipduel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting QuipDuel...");

    let config = GameConfig::from_env();
    let addr = config.bind_addr;

    let prompts = match PromptPool::from_file(&config.prompts_path) {
        Ok(pool) => {
            tracing::info!("Loaded {} prompts from {}", pool.len(), config.prompts_path);
            pool
        }
        Err(e) => {
            tracing::warn!(
                "Failed to load prompts from {}: {}. Rounds will use the fallback notice.",
                config.prompts_path,
                e
            );
            PromptPool::default()
        }
    };

    let bridge = Arc::new(BridgeTransport::new());
    let app_state = Arc::new(AppState::new(config, bridge.clone(), Arc::new(prompts)));
    let state = ws::ServerState {
        app: app_state,
        bridge,
    };

    let app = Router::new()
        .route("/bridge", get(ws::ws_handler))
        .route("/api/sessions", get(api::list_sessions))
        .route("/api/sessions/{group_id}", get(api::get_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
