//! HTTP client for the note API.
//!
//! Fetches todo-type notes via the `note/list` endpoint and hands them to
//! the core engine as [`TodoRecord`]s. Tag filters are given by name and
//! resolved to server-side tag ids with a preliminary scan, since the API
//! only filters by id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use todofeed_core::todo::{TodoRecord, parse_todo_records};

use crate::config::{ApiConfig, FetchQuery};
use crate::error::{ApiError, ApiResult};

/// Note type discriminator used by the API.
const NOTE_TYPE_FLASH: i32 = 0;
const NOTE_TYPE_TODO: i32 = 2;

/// Page size for the tag resolution scan.
const TAG_SCAN_SIZE: u32 = 1000;

/// Request body for the `note/list` endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteListRequest {
    page: u32,
    size: u32,
    tag_id: Option<i64>,
    search_text: String,
    order_by: &'static str,
    #[serde(rename = "type")]
    note_type: i32,
    is_archived: bool,
    is_recycle: bool,
    without_tag: bool,
    with_file: bool,
    with_link: bool,
    is_use_ai_query: bool,
    start_date: Option<String>,
    end_date: Option<String>,
    is_share: Option<bool>,
    has_todo: bool,
}

impl NoteListRequest {
    fn new(note_type: i32, size: u32, has_todo: bool) -> Self {
        Self {
            page: 1,
            size,
            tag_id: None,
            search_text: String::new(),
            order_by: "desc",
            note_type,
            is_archived: false,
            is_recycle: false,
            without_tag: false,
            with_file: false,
            with_link: false,
            is_use_ai_query: false,
            start_date: None,
            end_date: None,
            is_share: None,
            has_todo,
        }
    }
}

/// Shape of a note's tag attachments in the list response.
#[derive(Debug, Deserialize)]
struct NoteTagEntry {
    tag: Option<TagInfo>,
}

#[derive(Debug, Deserialize)]
struct TagInfo {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TaggedNote {
    #[serde(default)]
    tags: Vec<NoteTagEntry>,
}

/// Client for the note API.
#[derive(Debug)]
pub struct NoteApiClient {
    http_client: reqwest::Client,
    config: ApiConfig,
}

impl NoteApiClient {
    /// Creates a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the base URL or token is
    /// malformed, before any request is made.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ApiError::configuration("failed to build HTTP client").with_source(e)
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Fetches todo records matching the query.
    ///
    /// A `tag_name` filter first resolves the name to a server-side tag id;
    /// an unknown tag name fetches unfiltered rather than failing, matching
    /// the lenient posture of the rest of the pipeline.
    pub async fn fetch_todos(&self, query: &FetchQuery) -> ApiResult<Vec<TodoRecord>> {
        let tag_id = match &query.tag_name {
            Some(name) => {
                let resolved = self.resolve_tag_id(name).await?;
                if resolved.is_none() {
                    warn!(tag = %name, "tag not found, fetching unfiltered");
                }
                resolved
            }
            None => None,
        };

        let mut request = NoteListRequest::new(NOTE_TYPE_TODO, query.size, true);
        request.tag_id = tag_id;
        request.search_text = query.search_text.clone().unwrap_or_default();

        let payload = self.post_note_list(&request).await?;
        let todos = parse_todo_records(&payload)
            .map_err(|e| ApiError::invalid_response(e.to_string()).with_endpoint("note/list"))?;

        debug!(count = todos.len(), tag_id, "fetched todo records");
        Ok(todos)
    }

    /// Scans recent notes for a tag with the given name and returns its id.
    async fn resolve_tag_id(&self, tag_name: &str) -> ApiResult<Option<i64>> {
        let request = NoteListRequest::new(NOTE_TYPE_FLASH, TAG_SCAN_SIZE, false);
        let payload = self.post_note_list(&request).await?;

        let notes: Vec<TaggedNote> = serde_json::from_value(payload).map_err(|e| {
            ApiError::invalid_response(format!("failed to parse tag scan: {e}"))
                .with_endpoint("note/list")
        })?;

        for note in notes {
            for entry in note.tags {
                if let Some(tag) = entry.tag {
                    if tag.name == tag_name {
                        return Ok(Some(tag.id));
                    }
                }
            }
        }
        Ok(None)
    }

    /// Sends one `note/list` request and returns the raw JSON payload.
    async fn post_note_list(&self, body: &NoteListRequest) -> ApiResult<Value> {
        let url = format!("{}/note/list", self.config.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_timeout() {
                    ApiError::network("request timeout")
                } else if e.is_connect() {
                    ApiError::network(format!("connection failed: {e}"))
                } else {
                    ApiError::network(format!("request failed: {e}"))
                };
                err.with_endpoint("note/list")
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ApiError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {s} seconds"))
                    .unwrap_or_default()
            ))
            .with_endpoint("note/list"));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(
                ApiError::authentication("token expired or rejected").with_endpoint("note/list")
            );
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::not_found("note/list endpoint not found")
                .with_endpoint("note/list"));
        }

        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::bad_request(format!("request rejected: {body}"))
                    .with_endpoint("note/list"),
            );
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::server(format!("API error ({status}): {body}"))
                    .with_endpoint("note/list"),
            );
        }

        response.json().await.map_err(|e| {
            ApiError::invalid_response(format!("failed to parse response: {e}"))
                .with_endpoint("note/list")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_serializes_with_api_field_names() {
        let request = NoteListRequest::new(NOTE_TYPE_TODO, 30, true);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["page"], 1);
        assert_eq!(value["size"], 30);
        assert_eq!(value["type"], 2);
        assert_eq!(value["orderBy"], "desc");
        assert_eq!(value["tagId"], Value::Null);
        assert_eq!(value["isArchived"], false);
        assert_eq!(value["isUseAiQuery"], false);
        assert_eq!(value["isShare"], Value::Null);
        assert_eq!(value["hasTodo"], true);
    }

    #[test]
    fn tag_scan_body_does_not_require_todos() {
        let request = NoteListRequest::new(NOTE_TYPE_FLASH, TAG_SCAN_SIZE, false);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["type"], 0);
        assert_eq!(value["size"], 1000);
        assert_eq!(value["hasTodo"], false);
    }

    #[test]
    fn tag_scan_parses_nested_tag_shape() {
        let payload = serde_json::json!([
            {"tags": [{"tag": {"id": 9, "name": "work"}}, {"tag": null}]},
            {"tags": []},
            {}
        ]);

        let notes: Vec<TaggedNote> = serde_json::from_value(payload).unwrap();
        let found = notes
            .iter()
            .flat_map(|n| &n.tags)
            .filter_map(|e| e.tag.as_ref())
            .find(|t| t.name == "work");

        assert_eq!(found.map(|t| t.id), Some(9));
    }

    #[test]
    fn rejects_bad_config_before_any_request() {
        let err = NoteApiClient::new(ApiConfig::new("https://x.test", "not-a-jwt")).unwrap_err();
        assert_eq!(err.code(), crate::error::ApiErrorCode::ConfigurationError);
    }
}
