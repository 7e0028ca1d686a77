// dbx-files - Dropbox file manager core
// Folder browsing, batch uploads, deletes and downloads against a remote directory

pub mod config;
pub mod download;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod path;
pub mod providers;
pub mod upload;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AppConfig, ClientSettings, ConfigError};
pub use download::{ArchiveSink, DirectorySink, LinkOpener, SystemOpener};
pub use error::{FileManagerError, Result};
pub use navigation::{History, NavigationRequest, Navigator};
pub use notify::{ChannelNotifier, MessageKey, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use path::RemotePath;
pub use providers::{DropboxClient, Entry, EntryTag, FileMetadata, Listing, RemoteDirectory, RemoteError};
pub use upload::{UploadCoordinator, UploadFile, UploadTask};
pub use view::{DirectoryView, ViewState};
