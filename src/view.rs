//! Directory View - current folder, its listing and the loading flag
//!
//! The view is the only owner of [`ViewState`]. It publishes every change
//! through a `watch` channel, which is what a presentation layer renders from.
//!
//! Operations take `&self` so that several of them can be in flight on the
//! same task (e.g. an upload batch while the user keeps navigating). Each
//! listing fetch carries a ticket; results of a fetch that is no longer the
//! newest one, or that was issued for a path that is no longer current, are
//! dropped. The request itself is never cancelled.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::download::{ArchiveSink, DirectorySink, LinkOpener, SystemOpener};
use crate::error::{FileManagerError, Result};
use crate::navigation::{NavigationRequest, Navigator};
use crate::notify::{MessageKey, Notice, Notifier};
use crate::path::RemotePath;
use crate::providers::{Entry, EntryTag, FileMetadata, Listing, RemoteDirectory};
use crate::upload::{UploadCoordinator, UploadFile};

/// Snapshot of what the view shows
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    current_path: RemotePath,
    listing: Listing,
    is_loading: bool,
    in_flight: usize,
    generation: u64,
}

impl ViewState {
    pub fn current_path(&self) -> &RemotePath {
        &self.current_path
    }

    pub fn listing(&self) -> &[Entry] {
        &self.listing
    }

    /// True while any fetch, upload batch, delete or download is running
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

/// Identifies one listing fetch
#[derive(Debug, Clone)]
struct FetchTicket {
    generation: u64,
    path: RemotePath,
}

/// Keeps the loading flag raised while alive.
///
/// Dropping the guard (normal return, `?`, or the future being dropped)
/// lowers the flag once no other operation holds one.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<ViewState>,
}

impl<'a> LoadingGuard<'a> {
    fn acquire(state: &'a watch::Sender<ViewState>) -> Self {
        state.send_if_modified(|s| {
            s.in_flight += 1;
            !std::mem::replace(&mut s.is_loading, true)
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            let loading = s.in_flight > 0;
            loading != std::mem::replace(&mut s.is_loading, loading)
        });
    }
}

/// Directory View state machine
pub struct DirectoryView {
    remote: Arc<dyn RemoteDirectory>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    opener: Arc<dyn LinkOpener>,
    sink: Arc<dyn ArchiveSink>,
    max_concurrent_uploads: Option<usize>,
    state: watch::Sender<ViewState>,
}

impl DirectoryView {
    /// Create a view at the root with an empty listing.
    ///
    /// Links open in the system browser and folder archives are saved to the
    /// user's download directory unless replaced with the `with_*` methods.
    pub fn new(
        remote: Arc<dyn RemoteDirectory>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let download_dir = dirs::download_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        let (state, _) = watch::channel(ViewState::default());

        Self {
            remote,
            notifier,
            navigator,
            opener: Arc::new(SystemOpener),
            sink: Arc::new(DirectorySink::new(download_dir)),
            max_concurrent_uploads: None,
            state,
        }
    }

    pub fn with_opener(mut self, opener: Arc<dyn LinkOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn with_archive_sink(mut self, sink: Arc<dyn ArchiveSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_max_concurrent_uploads(mut self, max: Option<usize>) -> Self {
        self.max_concurrent_uploads = max;
        self
    }

    // ============ State access ============

    /// Receive every published state change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn current_path(&self) -> RemotePath {
        self.state.borrow().current_path.clone()
    }

    pub fn listing(&self) -> Listing {
        self.state.borrow().listing.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    // ============ Navigation ============

    /// The navigation path changed: make it current and fetch its listing.
    pub async fn on_path_change(&self, path: impl Into<RemotePath>) -> Result<()> {
        let ticket = self.issue_ticket(Some(path.into()));
        self.load(ticket).await
    }

    /// The browser location changed (e.g. `/files/docs`)
    pub async fn on_location_change(&self, location: &str) -> Result<()> {
        self.on_path_change(RemotePath::from_location(location)).await
    }

    /// Refetch the listing of the current path
    pub async fn refresh(&self) -> Result<()> {
        let ticket = self.issue_ticket(None);
        self.load(ticket).await
    }

    pub fn go_back(&self) {
        self.navigator.navigate(NavigationRequest::Offset(-1));
    }

    pub fn go_forward(&self) {
        self.navigator.navigate(NavigationRequest::Offset(1));
    }

    /// Start a new fetch generation, optionally moving to a new path
    fn issue_ticket(&self, path: Option<RemotePath>) -> FetchTicket {
        let mut ticket = FetchTicket { generation: 0, path: RemotePath::root() };
        self.state.send_if_modified(|s| {
            let moved = match path {
                Some(path) if path != s.current_path => {
                    s.current_path = path;
                    true
                }
                _ => false,
            };
            s.generation += 1;
            ticket = FetchTicket {
                generation: s.generation,
                path: s.current_path.clone(),
            };
            moved
        });
        ticket
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        let state = self.state.borrow();
        state.generation == ticket.generation && state.current_path == ticket.path
    }

    async fn load(&self, ticket: FetchTicket) -> Result<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        match self.remote.list_folder(ticket.path.as_navigation()).await {
            Ok(listing) => {
                let count = listing.len();
                let applied = self.state.send_if_modified(|s| {
                    if s.generation != ticket.generation || s.current_path != ticket.path {
                        return false;
                    }
                    s.listing = listing;
                    true
                });
                if applied {
                    debug!("Listed {} entries in {}", count, ticket.path);
                } else {
                    debug!("Discarded stale listing of {} (generation {})", ticket.path, ticket.generation);
                }
                Ok(())
            }
            Err(source) => {
                if !self.is_current(&ticket) {
                    debug!("Ignoring failed stale listing of {}: {}", ticket.path, source);
                    return Ok(());
                }

                warn!("Listing {} failed: {}", ticket.path, source);
                self.state.send_if_modified(|s| {
                    let had_entries = !s.listing.is_empty();
                    s.listing.clear();
                    had_entries
                });
                // The root has nowhere safer to go
                if !ticket.path.is_root() {
                    self.navigator.navigate(NavigationRequest::To(RemotePath::root()));
                }
                Err(FileManagerError::NavigationFault {
                    path: ticket.path.to_string(),
                    source,
                })
            }
        }
    }

    // ============ Mutations ============

    /// Delete a file or folder, then refetch the current listing.
    ///
    /// Nothing is removed locally before the service confirms.
    pub async fn delete(&self, path: &str, is_folder: bool) -> Result<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        match self.remote.delete_entry(path).await {
            Ok(_) => {
                info!("Deleted {} {}", if is_folder { "folder" } else { "file" }, path);
                self.notifier.notify(Notice::info(MessageKey::Deleted));
                // Listing failures recover on their own by redirecting to the root
                self.refresh().await.ok();
                Ok(())
            }
            Err(e) => {
                warn!("Delete of {} failed: {}", path, e);
                self.notifier.notify(Notice::error(MessageKey::DeleteFailed));
                Err(e.into())
            }
        }
    }

    /// Upload a batch of files into `target`, or into the current folder.
    ///
    /// All files share the destination resolved at call time. The batch
    /// yields one notice. The current listing is refetched only when the
    /// batch went into the folder that is still on screen.
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        target: Option<RemotePath>,
    ) -> Result<Vec<FileMetadata>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let current = self.current_path();
        let into_current = target.as_ref().map_or(true, |t| *t == current);
        let destination = target.unwrap_or(current);

        let _loading = LoadingGuard::acquire(&self.state);
        let coordinator = UploadCoordinator::new(self.remote.as_ref())
            .with_max_concurrent(self.max_concurrent_uploads);
        let tasks = UploadCoordinator::plan(files, &destination);

        match coordinator.upload_batch(tasks).await {
            Ok(uploaded) => {
                self.notifier.notify(Notice::success(MessageKey::Uploaded));
                if into_current && self.current_path() == destination {
                    self.refresh().await.ok();
                }
                Ok(uploaded)
            }
            Err(e) => {
                warn!("Upload into {} failed: {}", destination, e);
                self.notifier.notify(Notice::error(MessageKey::UploadFailed));
                Err(e)
            }
        }
    }

    // ============ Downloads ============

    /// Resolve a temporary link for a file and open it
    pub async fn download_file(&self, path: &str) -> Result<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        let result = self.open_link(path).await;
        self.report_download(path, result)
    }

    /// Download a folder as a zip archive named after its last segment
    pub async fn download_folder(&self, path: &str) -> Result<()> {
        let _loading = LoadingGuard::acquire(&self.state);

        let result = self.save_archive(path).await;
        self.report_download(path, result)
    }

    async fn open_link(&self, path: &str) -> Result<()> {
        let link = self.remote.temporary_link(path).await?;
        self.opener.open(&link)
    }

    async fn save_archive(&self, path: &str) -> Result<()> {
        let bytes = self.remote.download_folder_archive(path).await?;
        let name = RemotePath::from_navigation(path).archive_file_name();
        self.sink.save(&name, bytes).await
    }

    fn report_download(&self, path: &str, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => self.notifier.notify(Notice::info(MessageKey::Downloaded)),
            Err(e) => {
                warn!("Download of {} failed: {}", path, e);
                self.notifier.notify(Notice::error(MessageKey::DownloadFailed));
            }
        }
        result
    }

    // ============ Entry actions ============

    /// Follow a folder entry's link. Files are not links; returns whether
    /// a navigation was requested.
    pub fn open_entry(&self, entry: &Entry) -> Result<bool> {
        let path = target_of(entry)?;
        match entry.tag {
            EntryTag::Folder => {
                self.navigator.navigate(NavigationRequest::To(RemotePath::from_navigation(path)));
                Ok(true)
            }
            EntryTag::File => Ok(false),
        }
    }

    pub async fn download_entry(&self, entry: &Entry) -> Result<()> {
        let path = target_of(entry)?;
        match entry.tag {
            EntryTag::File => self.download_file(path).await,
            EntryTag::Folder => self.download_folder(path).await,
        }
    }

    pub async fn delete_entry(&self, entry: &Entry) -> Result<()> {
        let path = target_of(entry)?;
        self.delete(path, entry.is_folder()).await
    }

    /// Files dropped onto a folder row go into that folder
    pub async fn upload_into_entry(&self, entry: &Entry, files: Vec<UploadFile>) -> Result<Vec<FileMetadata>> {
        let path = target_of(entry)?;
        match entry.tag {
            EntryTag::Folder => {
                self.upload_files(files, Some(RemotePath::from_navigation(path))).await
            }
            EntryTag::File => Err(FileManagerError::NotAFolder(entry.name.clone())),
        }
    }
}

fn target_of(entry: &Entry) -> Result<&str> {
    entry
        .target()
        .ok_or_else(|| FileManagerError::InertEntry(entry.name.clone()))
}
