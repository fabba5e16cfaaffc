//! Render command: fetch one calendar and emit its feed.

use std::path::Path;

use chrono::Utc;

use todofeed_core::{CivilZone, feed};
use todofeed_provider::{ApiConfig, NoteApiClient, TodoSource};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Fetches the named calendar (or the first configured one) and writes
/// its feed to stdout or a file. With `--input` the todos come from a
/// local JSON file instead of the API.
pub async fn run(
    config: &CliConfig,
    api: Option<ApiConfig>,
    calendar: Option<&str>,
    input: Option<&Path>,
    output: Option<&Path>,
) -> CliResult<()> {
    let targets = config.targets();
    let target = match calendar {
        Some(name) => targets
            .iter()
            .find(|t| t.calendar_name == name)
            .ok_or_else(|| {
                CliError::config(format!("calendar {name:?} is not configured"))
            })?,
        None => &targets[0],
    };

    let zone = CivilZone::shanghai();
    let payload = match input {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|err| CliError::config(format!("{}: {err}", path.display())))?;
            feed::assemble_from_json(&value, &target.calendar_name, Utc::now(), &zone)?
        }
        None => {
            let api = api.ok_or_else(|| CliError::config("note API is not configured"))?;
            let client = NoteApiClient::new(api)?;
            let todos = TodoSource::fetch_todos(&client, &target.query).await?;
            feed::assemble(&todos, &target.calendar_name, Utc::now(), &zone)
        }
    };

    match output {
        Some(path) => std::fs::write(path, &payload)?,
        None => print!("{payload}"),
    }
    Ok(())
}
