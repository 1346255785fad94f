//! Porter API server entry point.
//!
//! Wires tracing, configuration, and the database client together and
//! serves the Axum router until the process is told to stop.

use porter_api::{create_api_router, ApiConfig, ApiError, ApiResult, DbClient, DbConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing();

    let db = DbClient::from_config(&DbConfig::from_env())?;
    let config = ApiConfig::from_env();
    let addr = config.bind_addr()?;

    let app = create_api_router(db, &config);

    tracing::info!(%addr, "Starting Porter API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    tokio::select! {
        served = axum::serve(listener, app) => {
            served.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("porter_api=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
