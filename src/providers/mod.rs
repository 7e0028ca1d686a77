//! Remote Directory Client
//!
//! Thin adapter between the file manager and the storage service. Every
//! operation is one request/response round trip: no retries, no caching and
//! no client-side state, so a failure never leaves anything half-applied here.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          RemoteDirectory Trait              │
//! │  list, upload, delete, link, archive        │
//! └─────────────────────────────────────────────┘
//!                      │
//!              ┌───────┴───────┐
//!              ▼               ▼
//!        ┌──────────┐    ┌───────────┐
//!        │ Dropbox  │    │ test fake │
//!        └──────────┘    └───────────┘
//! ```

pub mod types;
pub mod dropbox;

pub use types::*;
pub use dropbox::{DropboxClient, DropboxEndpoints};

use async_trait::async_trait;

/// Operations the file manager needs from a storage backend.
///
/// Paths are passed in navigation form (`/` for the root); implementations
/// convert them to whatever the service expects.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// List the entries of a folder
    async fn list_folder(&self, path: &str) -> Result<Listing, RemoteError>;

    /// Upload `bytes` to `path`, renaming on collision.
    ///
    /// `Ok(None)` means the service answered without an error but also
    /// without metadata; callers must treat it as a failed upload.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<Option<FileMetadata>, RemoteError>;

    /// Delete a file or folder (folders are removed with their contents)
    async fn delete_entry(&self, path: &str) -> Result<DeleteResult, RemoteError>;

    /// Resolve a short-lived download link for a file
    async fn temporary_link(&self, path: &str) -> Result<String, RemoteError>;

    /// Download a whole folder subtree as one zip archive
    async fn download_folder_archive(&self, path: &str) -> Result<Vec<u8>, RemoteError>;
}
