//! User-facing outcome notifications
//!
//! The core only emits a category and a symbolic key; rendering and
//! localization belong to whoever implements [`Notifier`].

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Symbolic message keys, namespaced like the translation tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    #[serde(rename = "messages.uploaded")]
    Uploaded,
    #[serde(rename = "messages.deleted")]
    Deleted,
    #[serde(rename = "messages.downloaded")]
    Downloaded,
    #[serde(rename = "errors.upload")]
    UploadFailed,
    #[serde(rename = "errors.delete")]
    DeleteFailed,
    #[serde(rename = "errors.download")]
    DownloadFailed,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::Uploaded => "messages.uploaded",
            MessageKey::Deleted => "messages.deleted",
            MessageKey::Downloaded => "messages.downloaded",
            MessageKey::UploadFailed => "errors.upload",
            MessageKey::DeleteFailed => "errors.delete",
            MessageKey::DownloadFailed => "errors.download",
        }
    }

    /// English text for front ends without their own translations
    pub fn fallback_text(&self) -> &'static str {
        match self {
            MessageKey::Uploaded => "Success uploaded!",
            MessageKey::Deleted => "Success deleted!",
            MessageKey::Downloaded => "Downloading started!",
            MessageKey::UploadFailed => "Error uploading file!",
            MessageKey::DeleteFailed => "Error deleting file!",
            MessageKey::DownloadFailed => "Error downloading file!",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub key: MessageKey,
}

impl Notice {
    pub fn success(key: MessageKey) -> Self {
        Self { level: NoticeLevel::Success, key }
    }

    pub fn info(key: MessageKey) -> Self {
        Self { level: NoticeLevel::Info, key }
    }

    pub fn error(key: MessageKey) -> Self {
        Self { level: NoticeLevel::Error, key }
    }
}

/// Receives one notice per finished user action
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(key = notice.key.as_str(), "{}", notice.key.fallback_text()),
            _ => info!(key = notice.key.as_str(), "{}", notice.key.fallback_text()),
        }
    }
}

/// Forwards notices to a presentation task
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new(tx: UnboundedSender<Notice>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // A closed receiver means the presentation layer is gone; nothing left to show
        let _ = self.tx.send(notice);
    }
}
