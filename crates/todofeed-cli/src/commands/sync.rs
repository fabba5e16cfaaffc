//! One-shot sync command.

use std::sync::Arc;

use todofeed_core::CivilZone;
use todofeed_provider::{ApiConfig, NoteApiClient};
use todofeed_server::{FeedStore, SyncRunner};

use crate::config::CliConfig;
use crate::error::CliResult;

/// Syncs every configured calendar once and prints the outcomes.
pub async fn run(config: &CliConfig, api: ApiConfig) -> CliResult<()> {
    let server = config.server_config()?;
    let client = NoteApiClient::new(api)?;
    let store = FeedStore::open(server.store_dir)?;
    let runner = SyncRunner::new(Arc::new(client), store, CivilZone::shanghai());

    let targets = config.targets();
    let report = runner.sync_all(&targets).await?;

    for outcome in &report.results {
        if outcome.succeeded() {
            println!(
                "{}: {} events",
                outcome.calendar_name,
                outcome.count.unwrap_or(0)
            );
        } else {
            println!(
                "{}: failed ({})",
                outcome.calendar_name,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if !report.all_succeeded() {
        let failed: Vec<_> = report
            .results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.calendar_name.as_str())
            .collect();
        return Err(crate::error::CliError::SyncFailed(failed.join(", ")));
    }
    Ok(())
}
