use std::panic;
use std::sync::Arc;

use colabri_session::{config::Config, routes::create_app, ws::SessionRegistry, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Load configuration before tracing so `LOG_LEVEL` can shape the default filter
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.default_log_filter().into()))
        .init();

    info!(environment = %config.environment, service = %config.service_name, "Starting server...");
    if let Err(e) = &loaded {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
    }
    let address = config.server_address();

    let app_state = Arc::new(AppState::new(config));
    let registry = app_state.registry.clone();
    let app_routes = create_app(app_state);

    // Start the HTTP/API server
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", address));

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSockets available at ws://{}/ws/documents/{{id}} and ws://{}/ws/rooms/{{id}}", address, address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    axum::serve(listener, app_routes)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .expect("Server failed to start");

    info!("Server stopped");
}

/// Resolves on Ctrl-C after closing every session, so open sockets do not hold the server up.
async fn shutdown_signal(registry: Arc<SessionRegistry>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
    registry.shutdown().await;
}
