//! Where downloads go once the service has answered

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{FileManagerError, Result};

/// Opens a temporary download link in a new browsing context
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &str) -> Result<()>;
}

/// Hands links to the platform's default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, link: &str) -> Result<()> {
        open::that_detached(link).map_err(|e| FileManagerError::Opener(e.to_string()))
    }
}

/// Persists a downloaded folder archive
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Writes archives into a local directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArchiveSink for DirectorySink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        // Never let a remote-derived name escape the target directory
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| FileManagerError::Sink(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid archive name: {}", file_name),
            )))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(name);
        tokio::fs::write(&target, &bytes).await?;

        info!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }
}
