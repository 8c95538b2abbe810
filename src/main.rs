use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use grc_backend::{config, middleware, router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first
    let config = config::Settings::new()?;

    // Initialize structured logging with configuration
    middleware::init_logging(&config.log_level, &config.log_format)?;

    tracing::info!("Starting GRC Backend v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = config.bind_address.parse()?;

    // Create application state with dependency injection
    let app_state = AppState::new(config).await?;
    let notifications = app_state.notifications.clone();

    let app = router::build_router(app_state);

    tracing::info!("Server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued notifications once no handler holds the dispatcher.
    match Arc::try_unwrap(notifications) {
        Ok(dispatcher) => dispatcher.shutdown().await,
        Err(_) => tracing::warn!("Notification dispatcher still shared, skipping drain"),
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
