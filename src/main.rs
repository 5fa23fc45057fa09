//! nodepay-keeper entry point
//!
//! Loads the config and account/proxy lists, spawns one worker per account,
//! and runs until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::info;

use nodepay_keeper::input;
use nodepay_keeper::proxy::ProxyConfig;
use nodepay_keeper::shutdown::ShutdownCoordinator;
use nodepay_keeper::stats::KeeperStats;
use nodepay_keeper::worker::Worker;
use nodepay_keeper::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = nodepay_keeper::init_logging();

    info!("Starting nodepay-keeper");
    if let Some(dir) = nodepay_keeper::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = AppConfig::load();

    let tokens = input::load_tokens(&config.tokens_file)
        .with_context(|| format!("failed to read tokens from {}", config.tokens_file.display()))?;
    anyhow::ensure!(
        !tokens.is_empty(),
        "no account tokens in {}",
        config.tokens_file.display()
    );

    let proxies: Vec<ProxyConfig> = match &config.proxies_file {
        Some(path) => input::load_proxies(path)
            .with_context(|| format!("failed to read proxies from {}", path.display()))?,
        None => Vec::new(),
    };

    info!(
        "Loaded {} accounts, {} proxies (interval: {}ms)",
        tokens.len(),
        proxies.len(),
        config.retry_interval
    );

    let stats = Arc::new(KeeperStats::new());
    let coordinator = ShutdownCoordinator::new();

    let mut workers = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.into_iter().enumerate() {
        let proxy = if proxies.is_empty() {
            None
        } else {
            Some(proxies[i % proxies.len()].clone())
        };
        let worker = Worker::new(&config, token, proxy, coordinator.register(), stats.clone())
            .context("failed to build worker")?;
        workers.push(Arc::new(worker));
    }

    for worker in &workers {
        let worker = Arc::clone(worker);
        // Stagger connects so a long account list does not hit the session
        // endpoint in one burst.
        let delay = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            worker.connect().await;
        });
    }

    coordinator.listen_for_interrupt().await;

    // Give ping loops a moment to observe cancellation before the final abort.
    tokio::time::sleep(Duration::from_millis(200)).await;
    for worker in &workers {
        worker.stop();
    }

    let snapshot = stats.snapshot();
    info!(
        sessions = snapshot.sessions_established,
        pings_sent = snapshot.pings_sent,
        pings_failed = snapshot.pings_failed,
        "Shutdown complete"
    );

    Ok(())
}
