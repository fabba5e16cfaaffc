//! Background sync daemon.

use std::sync::Arc;

use tracing::info;

use todofeed_core::CivilZone;
use todofeed_provider::{ApiConfig, NoteApiClient};
use todofeed_server::scheduler::{Scheduler, SchedulerConfig};
use todofeed_server::{FeedStore, SyncRunner};

use crate::config::CliConfig;
use crate::error::CliResult;

/// Runs the sync scheduler until interrupted.
pub async fn run(config: &CliConfig, api: ApiConfig) -> CliResult<()> {
    let server = config.server_config()?;
    let client = NoteApiClient::new(api)?;
    let store = FeedStore::open(&server.store_dir)?;
    let runner = Arc::new(SyncRunner::new(
        Arc::new(client),
        store,
        CivilZone::shanghai(),
    ));
    let targets = Arc::new(config.targets());

    let scheduler = Scheduler::new(SchedulerConfig::new(server.sync_interval));
    let handle = scheduler.handle();

    let scheduler_task = tokio::spawn(async move {
        scheduler
            .run(move || {
                let runner = runner.clone();
                let targets = targets.clone();
                async move {
                    let report = runner
                        .sync_all(&targets)
                        .await
                        .map_err(|e| e.to_string())?;
                    if report.all_succeeded() {
                        Ok(())
                    } else {
                        Err("one or more calendars failed".to_string())
                    }
                }
            })
            .await;
    });

    info!(
        interval_secs = server.sync_interval.as_secs(),
        store_dir = %server.store_dir.display(),
        "daemon running, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    let _ = handle.stop().await;
    let _ = scheduler_task.await;
    Ok(())
}
