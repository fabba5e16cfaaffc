//! Sync orchestration.
//!
//! One sync run fetches todos for each configured target, assembles its
//! feed and writes it to the store. Targets are independent: one failing
//! fetch marks its own outcome as failed and the run continues, so a
//! broken tag filter cannot take down the other calendars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use todofeed_core::{CivilZone, feed};
use todofeed_provider::{FetchQuery, TodoSource};

use crate::error::ServerResult;
use crate::store::FeedStore;

/// One calendar to sync: a query plus where its feed lands.
#[derive(Debug, Clone)]
pub struct SyncTarget {
    /// Calendar name, interpolated into the feed envelope.
    pub calendar_name: String,
    /// Feed filename within the store, must end in `.ics`.
    pub filename: String,
    /// Fetch parameters for this calendar.
    pub query: FetchQuery,
}

impl SyncTarget {
    /// Creates a target writing `<name>.ics` for the given calendar.
    pub fn new(calendar_name: impl Into<String>, query: FetchQuery) -> Self {
        let calendar_name = calendar_name.into();
        let filename = format!("{}.ics", calendar_name.to_lowercase().replace(' ', "-"));
        Self {
            calendar_name,
            filename,
            query,
        }
    }

    /// Overrides the feed filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// Whether one target's sync succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

/// The outcome of syncing one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// The target's calendar name.
    pub calendar_name: String,
    pub status: SyncStatus,
    /// Number of events in the written feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// The stored feed filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// The error message when the target failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    /// Returns true when the feed was written.
    pub fn succeeded(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

/// The persisted record of one full sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// When the run finished.
    pub last_sync: DateTime<Utc>,
    /// Per-target outcomes, in target order.
    pub results: Vec<SyncOutcome>,
}

impl SyncReport {
    /// Returns true when every target succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(SyncOutcome::succeeded)
    }
}

/// Runs syncs against a todo source and writes feeds to the store.
pub struct SyncRunner {
    source: Arc<dyn TodoSource>,
    store: FeedStore,
    zone: CivilZone,
}

impl SyncRunner {
    /// Creates a runner over the given source and store.
    pub fn new(source: Arc<dyn TodoSource>, store: FeedStore, zone: CivilZone) -> Self {
        Self { source, store, zone }
    }

    /// Syncs one target: fetch, assemble, persist.
    pub async fn sync_one(&self, target: &SyncTarget) -> ServerResult<usize> {
        let todos = self.source.fetch_todos(&target.query).await?;
        let count = todos.len();
        let payload = feed::assemble(&todos, &target.calendar_name, Utc::now(), &self.zone);
        self.store.save_feed(&target.filename, &payload)?;
        info!(
            calendar = %target.calendar_name,
            events = count,
            filename = %target.filename,
            "feed written"
        );
        Ok(count)
    }

    /// Syncs every target and persists the run report.
    ///
    /// Target failures are captured in the report, not propagated; only a
    /// failure to write the report itself is an error.
    pub async fn sync_all(&self, targets: &[SyncTarget]) -> ServerResult<SyncReport> {
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let outcome = match self.sync_one(target).await {
                Ok(count) => SyncOutcome {
                    calendar_name: target.calendar_name.clone(),
                    status: SyncStatus::Success,
                    count: Some(count),
                    filename: Some(target.filename.clone()),
                    error: None,
                },
                Err(e) => {
                    warn!(calendar = %target.calendar_name, error = %e, "target sync failed");
                    SyncOutcome {
                        calendar_name: target.calendar_name.clone(),
                        status: SyncStatus::Error,
                        count: None,
                        filename: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(outcome);
        }

        let report = SyncReport {
            last_sync: Utc::now(),
            results,
        };
        self.store.record_sync_report(&report)?;
        Ok(report)
    }
}
