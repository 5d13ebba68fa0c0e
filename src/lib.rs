pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServiceConfig};
use crate::core_state::CoreState;
use crate::pipeline::rag::RagError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot prepare data directory: {0}")]
    DataDir(std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Provider setup failed: {0}")]
    Provider(#[from] RagError),
    #[error("Server error: {0}")]
    Server(std::io::Error),
    #[error("Startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(StartupError::DataDir)?;
        }
    }
    // Migrations run once here; request connections find the schema current.
    db::open_database(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), "Database ready");

    // Blocking HTTP clients must be created off the async runtime.
    let provider_config = config.clone();
    let generator =
        tokio::task::spawn_blocking(move || pipeline::rag::providers::build_generator(&provider_config))
            .await??;

    let core = Arc::new(CoreState::new(config.db_path.clone(), generator));
    let mut server = api::start_api_server(core.clone(), config.bind_addr)
        .await
        .map_err(StartupError::Server)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;

    // Drop the blocking clients off the async runtime as well.
    tokio::task::spawn_blocking(move || drop(core)).await?;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
