//! Subscription Charger - daily `chargeExpiredSubscriptions()` on zkSync Era
//!
//! Fires once a day at a fixed UTC time, submits the charge transaction for
//! the configured SubscriptionManager and appends the outcome to a log file.
//! An optional HTTP surface starts and stops the schedule.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

mod api;
mod chain;
mod chains;
mod charge;
mod config;
mod error;
mod metrics;
mod scheduler;
mod tx;

use chain::ZkSyncProvider;
use charge::{ChargeJob, ChargeLog};
use config::Settings;
use metrics::MetricsServer;
use scheduler::Scheduler;
use tx::ZkSyncSigner;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    info!("Starting Subscription Charger v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    let network = settings.network()?;
    let rpc_url = settings.rpc_url()?;
    info!("Targeting {} (chain {}) via {}", network.name, network.id, rpc_url);

    let signer = ZkSyncSigner::from_env(&settings.wallet.private_key_env)
        .context("Failed to load signing key")?;

    let provider = ZkSyncProvider::new(
        &rpc_url,
        network.id,
        Duration::from_millis(settings.charger.poll_interval_ms),
        settings.charger.confirmation_timeout_secs.map(Duration::from_secs),
    )?;

    let job = ChargeJob::new(
        provider,
        signer,
        settings.contract_address()?,
        network,
        ChargeLog::new(settings.charger.log_file.clone()),
    );
    info!("Charge log: {}", settings.charger.log_file.display());

    let scheduler = Arc::new(Scheduler::new(settings.schedule()?, Arc::new(job)));
    info!("Daily charge time: {} UTC", scheduler.schedule());
    if settings.scheduler.autostart {
        scheduler.start().await;
    }
    if !scheduler.is_active().await {
        info!("Schedule is stopped until POST /start");
    }

    // Start API server
    let api_handle = if settings.api.enabled {
        let config = settings.api.clone();
        let scheduler = scheduler.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = api::run_server(config, scheduler).await {
                error!("API server error: {}", e);
            }
        }))
    } else {
        info!("HTTP API disabled");
        None
    };

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Subscription Charger is running");

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    scheduler.stop().await;
    if let Some(h) = api_handle {
        h.abort();
    }
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Subscription Charger stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,subscription_charger=debug,tower_http=info,hyper=warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
