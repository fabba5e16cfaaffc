//! Feed persistence.
//!
//! Feeds are plain `.ics` files in a store directory, each with a JSON
//! sidecar recording when it was written and how large it is. The store
//! also keeps the report of the last sync run for status queries.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::sync::SyncReport;

/// Sidecar metadata for one stored feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    /// When the feed was last written.
    pub last_updated: DateTime<Utc>,
    /// Size of the feed payload in bytes.
    pub size: u64,
    /// The feed's filename within the store.
    pub filename: String,
}

/// File-backed feed store.
#[derive(Debug, Clone)]
pub struct FeedStore {
    root: PathBuf,
}

/// Filename of the persisted sync report.
const SYNC_REPORT_FILE: &str = "sync-results.json";

impl FeedStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails when the path exists but is not a directory, or cannot be
    /// created.
    pub fn open(root: impl Into<PathBuf>) -> ServerResult<Self> {
        let root = root.into();
        if root.exists() {
            if !root.is_dir() {
                return Err(ServerError::store_dir_invalid(root.display().to_string()));
            }
        } else {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    /// Returns the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one feed and its metadata sidecar, replacing any previous
    /// version.
    pub fn save_feed(&self, filename: &str, payload: &str) -> ServerResult<FeedMetadata> {
        let filename = validate_filename(filename)?;
        let metadata = FeedMetadata {
            last_updated: Utc::now(),
            size: payload.len() as u64,
            filename: filename.to_string(),
        };

        fs::write(self.root.join(filename), payload)?;
        fs::write(
            self.sidecar_path(filename),
            serde_json::to_vec_pretty(&metadata)?,
        )?;

        debug!(filename, size = metadata.size, "saved feed");
        Ok(metadata)
    }

    /// Reads a stored feed payload.
    pub fn load_feed(&self, filename: &str) -> ServerResult<String> {
        let filename = validate_filename(filename)?;
        Ok(fs::read_to_string(self.root.join(filename))?)
    }

    /// Reads a feed's metadata sidecar, if present.
    pub fn metadata(&self, filename: &str) -> ServerResult<Option<FeedMetadata>> {
        let filename = validate_filename(filename)?;
        let path = self.sidecar_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Lists the filenames of all stored feeds.
    pub fn list_feeds(&self) -> ServerResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".ics") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Persists the report of the latest sync run.
    pub fn record_sync_report(&self, report: &SyncReport) -> ServerResult<()> {
        fs::write(
            self.root.join(SYNC_REPORT_FILE),
            serde_json::to_vec_pretty(report)?,
        )?;
        Ok(())
    }

    /// Reads the last persisted sync report, if any.
    pub fn last_sync_report(&self) -> ServerResult<Option<SyncReport>> {
        let path = self.root.join(SYNC_REPORT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn sidecar_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{filename}.meta.json"))
    }
}

/// Feed filenames must be bare `.ics` basenames, never paths.
fn validate_filename(name: &str) -> ServerResult<&str> {
    if !name.ends_with(".ics")
        || name.len() == ".ics".len()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
    {
        return Err(ServerError::invalid_filename(name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{SyncOutcome, SyncStatus};
    use tempfile::TempDir;

    fn store() -> (TempDir, FeedStore) {
        let dir = TempDir::new().unwrap();
        let store = FeedStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (_dir, store) = store();

        store.save_feed("work.ics", "BEGIN:VCALENDAR\r\nEND:VCALENDAR").unwrap();
        let payload = store.load_feed("work.ics").unwrap();
        assert!(payload.starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn sidecar_records_size_and_name() {
        let (_dir, store) = store();

        let written = store.save_feed("work.ics", "0123456789").unwrap();
        assert_eq!(written.size, 10);
        assert_eq!(written.filename, "work.ics");

        let loaded = store.metadata("work.ics").unwrap().unwrap();
        assert_eq!(loaded, written);
    }

    #[test]
    fn metadata_absent_for_unknown_feed() {
        let (_dir, store) = store();
        assert!(store.metadata("nope.ics").unwrap().is_none());
    }

    #[test]
    fn lists_only_ics_files() {
        let (_dir, store) = store();

        store.save_feed("b.ics", "x").unwrap();
        store.save_feed("a.ics", "x").unwrap();

        // Sidecars and the report file must not show up.
        assert_eq!(store.list_feeds().unwrap(), vec!["a.ics", "b.ics"]);
    }

    #[test]
    fn rejects_path_like_filenames() {
        let (_dir, store) = store();

        for name in ["../evil.ics", "sub/dir.ics", "noext", ".ics", "feed.txt"] {
            assert!(store.save_feed(name, "x").is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn sync_report_roundtrip() {
        let (_dir, store) = store();
        assert!(store.last_sync_report().unwrap().is_none());

        let report = SyncReport {
            last_sync: Utc::now(),
            results: vec![SyncOutcome {
                calendar_name: "work".to_string(),
                status: SyncStatus::Success,
                count: Some(3),
                filename: Some("work.ics".to_string()),
                error: None,
            }],
        };

        store.record_sync_report(&report).unwrap();
        let loaded = store.last_sync_report().unwrap().unwrap();
        assert_eq!(loaded.results.len(), 1);
        assert!(loaded.results[0].succeeded());
        assert_eq!(loaded.results[0].count, Some(3));
    }
}
