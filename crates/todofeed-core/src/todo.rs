//! Todo record input model.
//!
//! [`TodoRecord`] is the engine's view of one item from the note API. The
//! API is loosely typed: ids arrive as numbers or strings, `metadata` may be
//! any JSON shape, and every timestamp is an optional free-form string.
//! Deserialization is deliberately lenient so that one malformed record can
//! never abort a whole batch; interpreting the timestamps is the resolver's
//! job.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FeedError, FeedResult};

/// One todo item from the note API.
///
/// All fields are optional: the engine derives a well-formed calendar event
/// from whatever subset is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoRecord {
    /// Opaque identifier, unique per record. Numeric ids are stringified.
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<String>,
    /// Free-text content, possibly with list markup and embedded times.
    pub content: Option<String>,
    /// Creation timestamp as sent by the API (ISO 8601).
    pub created_at: Option<String>,
    /// Last-update timestamp as sent by the API (ISO 8601).
    pub updated_at: Option<String>,
    /// Top-level start date override.
    pub start_date: Option<String>,
    /// Top-level end date override.
    pub end_date: Option<String>,
    /// Nested date overrides; only honored when `metadata` was an object.
    #[serde(deserialize_with = "lenient_metadata")]
    pub metadata: Option<TodoMetadata>,
}

/// Date overrides nested under a todo's `metadata` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoMetadata {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TodoRecord {
    /// Creates a record with the given content, all other fields absent.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method to set the creation timestamp.
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    /// Builder method to set the update timestamp.
    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    /// Builder method to set the top-level start date.
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Builder method to set the top-level end date.
    pub fn with_end_date(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Builder method to set the metadata overrides.
    pub fn with_metadata(mut self, metadata: TodoMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the content, treating absence as empty text.
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Accepts a string or a number as the record id; any other shape is
/// treated as absent.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

/// Reads `metadata` only when it is a well-formed object; strings, numbers,
/// arrays and nulls all deserialize to no metadata.
fn lenient_metadata<'de, D>(deserializer: D) -> Result<Option<TodoMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Object(_) => serde_json::from_value(v).ok(),
        _ => None,
    }))
}

/// Parses the top-level API payload into todo records.
///
/// A non-array payload is the one condition the engine reports as an error
/// (`InvalidInput`). Individual records that cannot deserialize at all
/// degrade to an empty record instead of failing the batch.
pub fn parse_todo_records(value: &Value) -> FeedResult<Vec<TodoRecord>> {
    match value {
        Value::Array(items) => Ok(items
            .iter()
            .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
            .collect()),
        other => Err(FeedError::invalid_input(format!(
            "expected a todo array, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
