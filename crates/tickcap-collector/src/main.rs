//! tickcap-collector: exchange trade capture binary
//!
//! Spawns one supervisor task per built-in feed plus the periodic flush
//! task, then runs until SIGTERM/ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickcap_collector_lib::{
    builtin_feeds, run_flush_timer, shutdown::shutdown_signal, BufferStore, FeedSupervisor,
    FlushEngine, RetryPolicy,
};

mod config;
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    info!(
        data_dir = %config.data_dir.display(),
        symbols = ?config.symbols,
        "starting tickcap-collector"
    );

    std::fs::create_dir_all(&config.data_dir)?;

    let store = BufferStore::new(config.buffer_threshold);
    let engine = Arc::new(FlushEngine::new(&config.data_dir, store));

    let policy = RetryPolicy {
        reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        keepalive_interval: Duration::from_secs(config.keepalive_interval_secs),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::new();
    for feed in builtin_feeds(&config.symbols) {
        let supervisor = FeedSupervisor::new(feed, Arc::clone(&engine), policy);
        tasks.push(tokio::spawn(supervisor.run(shutdown_rx.clone())));
    }
    tasks.push(tokio::spawn(run_flush_timer(
        Arc::clone(&engine),
        Duration::from_secs(config.flush_interval_secs),
        shutdown_rx,
    )));

    shutdown_signal().await;
    info!("shutting down");
    shutdown_tx.send(true).ok();

    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "task panicked during shutdown");
        }
    }

    Ok(())
}
