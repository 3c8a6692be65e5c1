//! glucobot daemon: wires config, the scheduler engine, and the Telegram
//! adapter together.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::info;

use glucobot_core::config::GlucobotConfig;
use glucobot_core::conversation::SessionStore;
use glucobot_core::flags::NotifyFlags;
use glucobot_core::reminder::ReminderJob;
use glucobot_scheduler::{SchedulerEngine, SchedulerHandle};
use glucobot_telegram::TelegramAdapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "glucobot_core=info,glucobot_scheduler=info,glucobot_telegram=info,glucobot_daemon=info"
                    .into()
            }),
        )
        .init();

    // config: explicit path via GLUCOBOT_CONFIG, else ./glucobot.toml
    let config_path = std::env::var("GLUCOBOT_CONFIG").ok();
    let config = GlucobotConfig::load(config_path.as_deref())?;
    info!(
        duration = config.reminder.duration,
        interval = config.reminder.interval,
        "starting glucobot"
    );

    let flags = Arc::new(NotifyFlags::default());
    let sessions = Arc::new(SessionStore::default());

    // Fired-job channel: SchedulerEngine → delivery task.
    let (fired_tx, fired_rx) = mpsc::channel::<ReminderJob>(256);

    let scheduler = SchedulerHandle::default();
    let engine = SchedulerEngine::new(scheduler.clone(), fired_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(engine.run(shutdown_rx));

    let adapter = TelegramAdapter::new(&config, scheduler, flags, sessions);
    adapter.run(fired_rx).await;

    // The dispatcher returned (ctrl-c); stop the engine loop too.
    let _ = shutdown_tx.send(true);
    info!("glucobot stopped");
    Ok(())
}
