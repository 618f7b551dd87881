// Start of file: src/main.rs

use std::sync::Arc;
use axum::serve;
use tokio::net::TcpListener;
use tracing::info;

use devtracker_api::config::{environment::EnvironmentVariables, state::AppState};
use devtracker_api::core::{
    logging::init_tracing,
    server::{create_app, setup_listener, shutdown_signal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let environment: Arc<EnvironmentVariables> = Arc::new(EnvironmentVariables::instance()?.clone());
    let state: AppState = AppState::initialize(environment.clone()).await?;

    let listener: TcpListener = setup_listener(&environment).await?;
    info!(
        environment = %environment.environment,
        "Server listening on: {}",
        listener.local_addr()?
    );

    serve(listener, create_app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close the pool and cache connections once in-flight requests have drained
    state.shutdown().await;
    info!("Server stopped");
    Ok(())
}

// End of file: src/main.rs
