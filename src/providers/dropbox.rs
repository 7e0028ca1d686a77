//! Dropbox Remote Directory Client
//!
//! Implements RemoteDirectory for Dropbox using the Dropbox API v2.
//! Authenticates with a pre-issued access token.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{
    sanitize_api_error, DeleteResult, Entry, FileMetadata, Listing, RemoteDirectory, RemoteError,
};
use crate::config::AppConfig;
use crate::path::storage_path;

/// Dropbox API endpoints
pub const API_BASE: &str = "https://api.dropboxapi.com/2";
pub const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

/// List folder response
#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<Entry>,
    cursor: String,
    has_more: bool,
}

/// Temporary link response
#[derive(Debug, Deserialize)]
struct TemporaryLinkResult {
    link: String,
}

/// Base URLs for RPC and content requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropboxEndpoints {
    pub api_base: String,
    pub content_base: String,
}

impl Default for DropboxEndpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
        }
    }
}

/// Dropbox client
pub struct DropboxClient {
    client: reqwest::Client,
    access_token: SecretString,
    endpoints: DropboxEndpoints,
}

impl DropboxClient {
    pub fn new(access_token: SecretString, endpoints: DropboxEndpoints, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            access_token,
            endpoints,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.access_token.clone(),
            config.endpoints(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Get authorization header
    fn auth_header(&self) -> Result<HeaderValue, RemoteError> {
        HeaderValue::from_str(&format!("Bearer {}", self.access_token.expose_secret()))
            .map_err(|e| RemoteError::Authentication(format!("Invalid token: {}", e)))
    }

    /// Make API call with RPC style
    async fn rpc_call<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, RemoteError> {
        let url = format!("{}/{}", self.endpoints.api_base, endpoint);

        let response = self.client
            .post(&url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), &text));
        }

        response.json().await
            .map_err(|e| RemoteError::Parse(format!("{}: {}", endpoint, e)))
    }

    /// Make API call with content-upload/download style.
    ///
    /// Arguments travel in the `Dropbox-API-Arg` header; the body is the raw
    /// file content (if any).
    async fn content_call(
        &self,
        endpoint: &str,
        arg: &serde_json::Value,
        body: Option<Vec<u8>>,
    ) -> Result<reqwest::Response, RemoteError> {
        let url = format!("{}/{}", self.endpoints.content_base, endpoint);
        let arg = HeaderValue::from_str(&header_safe_json(arg))
            .map_err(|e| RemoteError::InvalidRequest(format!("Invalid API argument: {}", e)))?;

        let mut request = self.client
            .post(&url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header("Dropbox-API-Arg", arg);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(body);
        }

        let response = request
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::from_status(status.as_u16(), &text));
        }

        Ok(response)
    }
}

/// Arguments for `files/list_folder`
fn list_folder_arg(path: &str) -> serde_json::Value {
    serde_json::json!({
        "path": storage_path(path),
        "recursive": false,
        "include_deleted": false,
        "include_has_explicit_shared_members": false,
        "include_mounted_folders": true
    })
}

/// Arguments for `files/upload`: add, rename on conflict, notify
fn upload_arg(path: &str) -> serde_json::Value {
    serde_json::json!({
        "path": path,
        "mode": "add",
        "autorename": true,
        "mute": false
    })
}

/// Serialize JSON for an HTTP header: non-ASCII characters and DEL become
/// `\uXXXX` escapes (UTF-16 surrogate pairs outside the BMP).
fn header_safe_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() && c != '\u{7f}' {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[async_trait]
impl RemoteDirectory for DropboxClient {
    async fn list_folder(&self, path: &str) -> Result<Listing, RemoteError> {
        let mut result: ListFolderResult = self.rpc_call("files/list_folder", &list_folder_arg(path)).await?;
        let mut all_entries = result.entries;

        while result.has_more {
            let continue_body = serde_json::json!({
                "cursor": result.cursor
            });
            result = self.rpc_call("files/list_folder/continue", &continue_body).await?;
            all_entries.extend(result.entries);
        }

        debug!("Listed {} entries in {}", all_entries.len(), path);
        Ok(all_entries)
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<Option<FileMetadata>, RemoteError> {
        let size = bytes.len();
        let response = self.content_call("files/upload", &upload_arg(path), Some(bytes)).await?;

        let body = response.bytes().await?;
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }

        let metadata: FileMetadata = serde_json::from_slice(&body)?;

        info!("Uploaded {} bytes to {}", size, metadata.path_display.as_deref().unwrap_or(path));
        Ok(Some(metadata))
    }

    async fn delete_entry(&self, path: &str) -> Result<DeleteResult, RemoteError> {
        let body = serde_json::json!({
            "path": path
        });

        let result: DeleteResult = self.rpc_call("files/delete_v2", &body).await?;

        info!("Deleted: {}", path);
        Ok(result)
    }

    async fn temporary_link(&self, path: &str) -> Result<String, RemoteError> {
        let body = serde_json::json!({
            "path": path
        });

        let result: TemporaryLinkResult = self.rpc_call("files/get_temporary_link", &body).await?;

        // Guard against the service handing back something we should not open
        let link = url::Url::parse(&result.link)
            .map_err(|e| RemoteError::Parse(format!("Invalid temporary link: {}", e)))?;
        Ok(link.into())
    }

    async fn download_folder_archive(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        let arg = serde_json::json!({
            "path": path
        });

        let response = self.content_call("files/download_zip", &arg, None).await?;
        let bytes = response.bytes().await
            .map_err(|e| RemoteError::Connection(format!("Archive download failed: {}", sanitize_api_error(&e.to_string()))))?;

        info!("Downloaded archive of {} ({} bytes)", path, bytes.len());
        Ok(bytes.to_vec())
    }
}
