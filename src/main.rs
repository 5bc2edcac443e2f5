use anyhow::Result;
use cdc_control_plane::models::DbRole;
use cdc_control_plane::{CdcBackend, Config, HttpBackend, SyncStatusPoller};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};

/// Wait for shutdown signal (SIGTERM, SIGINT, or Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}

async fn log_summary(poller: &SyncStatusPoller) {
    let dashboard = poller.snapshot().await;

    let side = |role: DbRole| match dashboard.connection_status.as_ref() {
        Some(status) if status.is_connected(role) => "connected",
        Some(_) => "disconnected",
        None => "unknown",
    };

    match &dashboard.sync_status {
        Some(sync) => tracing::info!(
            "source {}, destination {}, sync {}, {} records synced, {} rules{}",
            side(DbRole::Source),
            side(DbRole::Destination),
            if sync.sync_running { "running" } else { "idle" },
            sync.total_records_synced,
            dashboard.rules.as_ref().map(Vec::len).unwrap_or(0),
            dashboard
                .last_error
                .as_ref()
                .map(|e| format!(" (stale: {})", e))
                .unwrap_or_default()
        ),
        None => tracing::info!(
            "No status received yet{}",
            dashboard
                .last_error
                .as_ref()
                .map(|e| format!(": {}", e))
                .unwrap_or_default()
        ),
    }

    if let Some(sync) = &dashboard.sync_status {
        for error in &sync.errors {
            tracing::warn!("Sync engine reported: {}", error);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cdc_control_plane=info".parse()?)
                .add_directive("cdc_monitor=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        "Monitoring CDC backend at {} every {}s",
        config.api_base_url,
        config.status_poll_interval.as_secs()
    );

    let backend: Arc<dyn CdcBackend> = Arc::new(HttpBackend::new(&config.api_base_url));
    let poller = SyncStatusPoller::new(Arc::clone(&backend), config.status_poll_interval);

    if let Err(e) = poller.refresh_all().await {
        tracing::warn!("Initial load failed, continuing with polling: {}", e.user_message());
    }
    poller.start().await;

    let mut ticker = interval(config.status_poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let report = async {
        loop {
            ticker.tick().await;
            log_summary(&poller).await;
        }
    };

    tokio::select! {
        _ = report => {}
        _ = shutdown_signal() => {
            tracing::info!("CDC monitor shutting down");
        }
    }

    poller.stop().await;
    Ok(())
}
