//! Attendance bot entry point.
//!
//! Loads configuration, opens the identity store, ingests the roster and
//! long-polls the chat platform until Ctrl-C. Every inbound event is handled
//! in its own task; on shutdown those tasks are drained before the store is
//! closed.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use attendance_bot::adapters::{
    RedisIdentityStore, TelegramTransport, UpdatePoller, UpdatePollerConfig,
};
use attendance_bot::application::{AttendanceBot, EventTasks, RosterLoader};
use attendance_bot::config::{AppConfig, LogFormat, LoggingConfig};
use attendance_bot::ports::IdentityStore;

const EVENT_BUFFER: usize = 256;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

fn init_tracing(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(true);

    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    init_tracing(&config.logging);

    let store: Arc<dyn IdentityStore> = Arc::new(
        RedisIdentityStore::open(&config.redis)
            .await
            .context("failed to open identity store")?,
    );

    let loaded = RosterLoader::new(store.clone())
        .load(&config.roster.path)
        .await
        .with_context(|| format!("failed to load roster from {}", config.roster.path.display()))?;

    let telegram = Arc::new(
        TelegramTransport::new(&config.telegram).context("failed to create Telegram client")?,
    );
    let bot = Arc::new(AttendanceBot::new(
        store.clone(),
        telegram.clone(),
        loaded.roster,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);

    let mut poller = UpdatePoller::with_config(
        telegram,
        UpdatePollerConfig::default().with_poll_timeout(config.telegram.poll_timeout()),
    );
    let poller_task = tokio::spawn(async move { poller.run(events_tx, shutdown_rx).await });

    tracing::info!("Attendance bot running");

    let mut tasks = EventTasks::new(bot);

    loop {
        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else { break };
                tasks.spawn(event);
            }
            Some(()) = tasks.join_next(), if !tasks.is_empty() => {}
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                }
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = poller_task.await {
        tracing::warn!(error = %e, "Update poller task failed");
    }
    let aborted = tasks.drain(SHUTDOWN_GRACE).await;
    if aborted > 0 {
        tracing::warn!(aborted, "Some events were abandoned at shutdown");
    }
    store.close().await.context("failed to close identity store")?;
    tracing::info!("Attendance bot stopped");
    Ok(())
}
