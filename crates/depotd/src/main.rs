//! depotd — depot file service daemon.

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use depot_core::config::DepotConfig;
use depot_services::{Listener, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = DepotConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = DepotConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        DepotConfig::default()
    });

    // File repository root
    let files_root = config.storage.files_dir.clone();
    std::fs::create_dir_all(&files_root)
        .with_context(|| format!("failed to create file repository {}", files_root.display()))?;
    tracing::info!(path = %files_root.display(), "file repository root");

    // Shared state
    let state = ServerState::new(config.limits.max_clients);

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Serve ────────────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.network.host, config.network.port);
    let listener = Listener::bind(
        &addr,
        state,
        files_root,
        config.limits.ack_timeout(),
        shutdown_tx.subscribe(),
    )
    .await?;

    listener.run().await
}
