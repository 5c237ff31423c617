//! Command-line client for the checklist compliance store.
//!
//! Loads the shared document (seeding it on first use), runs one
//! subcommand against it and writes the result to stdout. Logs go to
//! stderr and are controlled by `RUST_LOG`.

use anyhow::Context as _;
use checklist_store_core::{seed, IdGenerator, SyncSession, UuidGenerator};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Context;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    info!("Starting checklist-sync v{}", env!("CARGO_PKG_VERSION"));
    info!("  Backend: {}", config.backend);

    let store = config.build_store();
    let session = SyncSession::open(store, seed::initial_document())
        .await
        .context("Failed to load the checklist document")?;

    let ids = UuidGenerator;
    let ctx = Context {
        session: &session,
        ids: &ids,
        user_id: config.user_id.clone().unwrap_or_else(|| ids.next_id()),
        write_attempts: config.write_attempts,
        now: chrono::Utc::now(),
    };

    let mut stdout = std::io::stdout().lock();
    commands::run(&ctx, config.command, &mut stdout).await
}
