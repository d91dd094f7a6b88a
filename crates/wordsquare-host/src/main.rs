//! Wordsquare game host.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordsquare_core::WordList;
use wordsquare_host::{run_sweep, Config, GameService, InMemoryRepository, LogNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    info!("Starting Wordsquare host...");

    let dictionary = WordList::load_dir(&config.dictionary_path).with_context(|| {
        format!("Failed to load dictionaries from {}", config.dictionary_path.display())
    })?;

    let service = Arc::new(GameService::new(
        Arc::new(InMemoryRepository::new()),
        Arc::new(LogNotifier),
        Arc::new(dictionary),
        config.game.clone(),
        config.default_language.clone(),
    ));

    let sweep = tokio::spawn(run_sweep(
        service,
        config.sweep_interval(),
        config.reminder_lead(),
    ));
    info!("Turn sweep running every {:?}", config.sweep_interval());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    sweep.abort();

    Ok(())
}
