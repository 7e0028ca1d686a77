use thiserror::Error;

use crate::providers::RemoteError;

/// Result type for file manager operations.
pub type Result<T> = std::result::Result<T, FileManagerError>;

/// Errors surfaced by file manager operations.
#[derive(Debug, Error)]
pub enum FileManagerError {
    /// A storage service call failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The service accepted an upload request but returned no metadata.
    #[error("Upload failed: {path}")]
    UploadFailure { path: String },

    /// At least one upload of a batch failed.
    #[error("Upload of {failed} of {total} files failed")]
    UploadBatch { failed: usize, total: usize },

    /// Listing a folder failed while navigating.
    #[error("Could not list {path}: {source}")]
    NavigationFault {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// The entry has no path and cannot be targeted.
    #[error("Entry {0} cannot be targeted")]
    InertEntry(String),

    /// Only folders accept uploads.
    #[error("{0} is not a folder")]
    NotAFolder(String),

    /// Persisting a downloaded archive failed.
    #[error("Could not save archive: {0}")]
    Sink(#[from] std::io::Error),

    /// Opening a download link failed.
    #[error("Could not open link: {0}")]
    Opener(String),
}
