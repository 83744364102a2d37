use certforge::{
    build_application, config::AppConfig, observability::{init_tracing, log_config_info},
    CertforgeError, Result, APP_NAME, VERSION,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = AppConfig::from_env()?;
    init_tracing(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting certforge certificate service");
    log_config_info(&config);

    let app = build_application(&config);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await.map_err(|e| {
        CertforgeError::config(format!("Failed to bind HTTP server to {}: {}", bind_address, e))
    })?;

    info!(address = %bind_address, "HTTP server listening");

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(CertforgeError::from)?;

    info!("certforge shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
