use anyhow::Result;
use baloto::{PickController, SqliteStore, SystemClock, config};
use baloto_mcp::{MCPHandler, PickUseCase, stdio};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Let's pick your baloto numbers.");

    let store = SqliteStore::open(&config.database_url)?;
    let mut controller = PickController::new(store, Arc::new(SystemClock));

    // A failed check is retried on save or through the check_guard tool.
    if let Err(e) = controller.mount().await {
        tracing::warn!("initial guard check failed: {}", e);
    }

    let pick_use_case = PickUseCase::new(Arc::new(Mutex::new(controller)));
    let handler = MCPHandler::new(Arc::new(pick_use_case));

    let (reader, writer) = stdio();

    handler.serve(reader, writer).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    Ok(())
}
