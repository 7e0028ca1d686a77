// Batch upload coordination
// Every file of a batch goes to the same folder; the batch succeeds or fails as one unit

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{FileManagerError, Result};
use crate::path::RemotePath;
use crate::providers::{FileMetadata, RemoteDirectory};

/// A file picked or dropped by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// One file bound to its destination; consumed by exactly one upload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub file: UploadFile,
    pub destination: RemotePath,
}

/// Issues the uploads of one batch and folds their results
pub struct UploadCoordinator<'a> {
    remote: &'a dyn RemoteDirectory,
    limit: Option<Semaphore>,
}

impl<'a> UploadCoordinator<'a> {
    pub fn new(remote: &'a dyn RemoteDirectory) -> Self {
        Self { remote, limit: None }
    }

    /// Cap how many uploads run at once (clamped to at least one)
    pub fn with_max_concurrent(mut self, max: Option<usize>) -> Self {
        self.limit = max.map(|m| Semaphore::new(m.max(1)));
        self
    }

    /// Resolve every file's destination inside `folder`.
    ///
    /// No collision check: the service renames on conflict.
    pub fn plan(files: Vec<UploadFile>, folder: &RemotePath) -> Vec<UploadTask> {
        files
            .into_iter()
            .map(|file| UploadTask {
                destination: folder.child(&file.name),
                file,
            })
            .collect()
    }

    /// Upload all tasks at once and wait for every one of them.
    ///
    /// Returns the metadata of every file, or a single `UploadBatch` error if
    /// any upload failed or came back without metadata.
    pub async fn upload_batch(&self, tasks: Vec<UploadTask>) -> Result<Vec<FileMetadata>> {
        let total = tasks.len();
        let results = join_all(tasks.into_iter().map(|task| self.upload_one(task))).await;

        let mut uploaded = Vec::with_capacity(total);
        let mut failed = 0;
        for result in results {
            match result {
                Ok(metadata) => uploaded.push(metadata),
                Err(e) => {
                    warn!("Upload failed: {}", e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(FileManagerError::UploadBatch { failed, total });
        }

        info!("Uploaded batch of {} files", total);
        Ok(uploaded)
    }

    async fn upload_one(&self, task: UploadTask) -> Result<FileMetadata> {
        // The semaphore is never closed, so acquiring only waits
        let _permit = match &self.limit {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };

        let path = task.destination.as_navigation().to_string();
        match self.remote.upload(&path, task.file.bytes).await? {
            Some(metadata) => Ok(metadata),
            None => Err(FileManagerError::UploadFailure { path }),
        }
    }
}
