//! Shared types for the remote directory client
//!
//! Listing entries, upload/delete results and the error type every remote
//! call fails with.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest error body kept in messages and logs
const MAX_ERROR_BODY: usize = 300;

/// Kind of a listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    File,
    Folder,
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryTag::File => write!(f, "file"),
            EntryTag::Folder => write!(f, "folder"),
        }
    }
}

/// One file or folder record of a directory listing.
///
/// Only `tag`, `name` and `path_lower` are interpreted. Everything else the
/// service sends (size, revision, timestamps, ...) is kept verbatim in
/// `metadata` and handed to the presentation layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = ".tag")]
    pub tag: EntryTag,
    /// Display name, not path-qualified
    pub name: String,
    /// Canonical lowercase full path; the identity used for operations
    #[serde(default)]
    pub path_lower: Option<String>,
    /// Service-specific fields, passed through opaquely
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    /// Create a folder entry (used by tests and fakes)
    pub fn folder(name: &str, path_lower: &str) -> Self {
        Self::new(EntryTag::Folder, name, path_lower)
    }

    /// Create a file entry (used by tests and fakes)
    pub fn file(name: &str, path_lower: &str) -> Self {
        Self::new(EntryTag::File, name, path_lower)
    }

    fn new(tag: EntryTag, name: &str, path_lower: &str) -> Self {
        Self {
            tag,
            name: name.to_string(),
            path_lower: Some(path_lower.to_string()),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.tag == EntryTag::Folder
    }

    /// Path this entry can be targeted by, if any.
    ///
    /// Entries without a non-empty `path_lower` are inert: they can be shown
    /// but never deleted, downloaded or uploaded into.
    pub fn target(&self) -> Option<&str> {
        self.path_lower.as_deref().filter(|p| !p.is_empty())
    }

    /// File size in bytes, when the service reported one
    pub fn size(&self) -> Option<u64> {
        self.metadata.get("size").and_then(|v| v.as_u64())
    }

    /// Server modification time (ISO 8601), when reported
    pub fn server_modified(&self) -> Option<&str> {
        self.metadata.get("server_modified").and_then(|v| v.as_str())
    }
}

/// Ordered snapshot of a folder's entries
pub type Listing = Vec<Entry>;

/// Metadata returned for a freshly uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(default)]
    pub path_lower: Option<String>,
    #[serde(default)]
    pub path_display: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub server_modified: Option<String>,
}

/// Result of a delete: metadata of what was removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub metadata: Entry,
}

/// Errors returned by the remote directory client
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RemoteError {
    /// Map a non-success HTTP response to an error.
    ///
    /// Dropbox reports endpoint errors as HTTP 409 with an `error_summary`
    /// such as `path/not_found/..`.
    pub fn from_status(status: u16, body: &str) -> Self {
        let summary = error_summary(body).unwrap_or_else(|| sanitize_api_error(body));
        match status {
            401 => RemoteError::Authentication(summary),
            409 if summary.contains("not_found") => RemoteError::NotFound(summary),
            409 => RemoteError::Conflict(summary),
            429 => RemoteError::RateLimited(summary),
            _ => RemoteError::Api { status, message: summary },
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Parse(e.to_string())
        } else {
            RemoteError::Connection(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Parse(e.to_string())
    }
}

/// Pull `error_summary` out of a Dropbox error body
fn error_summary(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error_summary")
        .and_then(|s| s.as_str())
        .map(sanitize_api_error)
}

/// Collapse whitespace and cap the length of an API error body
pub fn sanitize_api_error(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_ERROR_BODY {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(MAX_ERROR_BODY).collect();
    truncated.push_str("...");
    truncated
}
