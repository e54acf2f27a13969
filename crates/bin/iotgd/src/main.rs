//! # iotgd: IoTG300 status bridge daemon
//!
//! Composition root that wires the hardware adapter into the device adapter
//! and keeps it running.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Construct the procfs hardware channel and the notification bus
//! - Spawn the device adapter, which announces devices and starts polling
//! - Log every notification as one JSON line
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use anyhow::Context;
use tokio::signal;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use iotg_adapter_procfs::ProcfsChannel;
use iotg_app::adapter::Adapter;
use iotg_app::event_bus::InProcessBus;

use crate::config::Config;

const BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    tracing::info!(
        proc_dir = %config.hardware.proc_dir.display(),
        helper = %config.hardware.helper.display(),
        poll_interval_secs = config.polling.interval_secs,
        "starting iotgd"
    );

    let bus = InProcessBus::new(BUS_CAPACITY);
    let console = tokio::spawn(log_notifications(BroadcastStream::new(bus.subscribe())));

    let channel = ProcfsChannel::new(config.hardware.clone());
    let (handle, adapter) = Adapter::new(channel, bus, config.adapter_config()).spawn();

    let things = handle.things().await.context("adapter stopped during startup")?;
    tracing::info!(count = things.len(), "devices announced");

    shutdown_signal().await.context("failed to listen for shutdown signals")?;

    // the adapter stops once its last handle is gone
    drop(handle);
    adapter.await.context("adapter task failed")?;
    console.await.context("notification logger failed")?;

    tracing::info!("iotgd stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn log_notifications(mut stream: BroadcastStream<iotg_domain::event::Notification>) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(notification) => match serde_json::to_string(&notification) {
                Ok(json) => tracing::info!(
                    target: "iotgd::notification",
                    device = %notification.device_id(),
                    "{json}"
                ),
                Err(err) => tracing::warn!(%err, "failed to serialize notification"),
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notification log fell behind");
            }
        }
    }
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                tracing::info!("received Ctrl+C, shutting down");
            }
            _ = terminate.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        tracing::info!("received Ctrl+C, shutting down");
    }

    Ok(())
}
