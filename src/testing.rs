//! Scripted in-memory storage service for tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::download::{ArchiveSink, LinkOpener};
use crate::error::Result;
use crate::navigation::{NavigationRequest, Navigator};
use crate::notify::{Notice, Notifier};
use crate::providers::{DeleteResult, Entry, FileMetadata, Listing, RemoteDirectory, RemoteError};

/// A request the fake received, with its path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Upload(String),
    Delete(String),
    Link(String),
    Archive(String),
}

/// Holds matching requests until released
pub struct Gate {
    tx: watch::Sender<bool>,
}

impl Gate {
    fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

async fn pass(gate: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = gate {
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[derive(Default)]
struct FakeState {
    listings: HashMap<String, Listing>,
    list_errors: HashSet<String>,
    list_gates: HashMap<String, watch::Receiver<bool>>,
    upload_gate: Option<watch::Receiver<bool>>,
    upload_errors: HashSet<String>,
    upload_absent: HashSet<String>,
    delete_errors: HashSet<String>,
    link_errors: HashSet<String>,
    archive_errors: HashSet<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => path[..i].to_string(),
    }
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn with_listing(self, path: &str, entries: Listing) -> Self {
        self.state().listings.insert(path.to_string(), entries);
        self
    }

    /// Hold listings of `path` until the gate is released
    pub fn hold_listing(&self, path: &str) -> Gate {
        let (gate, rx) = Gate::new();
        self.state().list_gates.insert(path.to_string(), rx);
        gate
    }

    /// Hold every upload until the gate is released
    pub fn hold_uploads(&self) -> Gate {
        let (gate, rx) = Gate::new();
        self.state().upload_gate = Some(rx);
        gate
    }

    pub fn fail_listing(&self, path: &str) {
        self.state().list_errors.insert(path.to_string());
    }

    pub fn fail_upload(&self, path: &str) {
        self.state().upload_errors.insert(path.to_string());
    }

    /// Answer the upload of `path` without error and without metadata
    pub fn fail_upload_silently(&self, path: &str) {
        self.state().upload_absent.insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        self.state().delete_errors.insert(path.to_string());
    }

    pub fn fail_link(&self, path: &str) {
        self.state().link_errors.insert(path.to_string());
    }

    pub fn fail_archive(&self, path: &str) {
        self.state().archive_errors.insert(path.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn calls_matching(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn list_calls(&self, path: &str) -> usize {
        self.calls_matching(|c| *c == Call::List(path.to_string()))
    }
}

#[async_trait]
impl RemoteDirectory for FakeRemote {
    async fn list_folder(&self, path: &str) -> std::result::Result<Listing, RemoteError> {
        let gate = {
            let mut state = self.state();
            state.calls.push(Call::List(path.to_string()));
            state.list_gates.get(path).cloned()
        };
        pass(gate).await;

        let state = self.state();
        if state.list_errors.contains(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        Ok(state.listings.get(path).cloned().unwrap_or_default())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> std::result::Result<Option<FileMetadata>, RemoteError> {
        let gate = {
            let mut state = self.state();
            state.calls.push(Call::Upload(path.to_string()));
            state.upload_gate.clone()
        };
        pass(gate).await;

        let mut state = self.state();
        if state.upload_errors.contains(path) {
            return Err(RemoteError::Api { status: 500, message: "upload rejected".into() });
        }
        if state.upload_absent.contains(path) {
            return Ok(None);
        }

        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        state
            .listings
            .entry(parent_of(path))
            .or_default()
            .push(Entry::file(&name, &path.to_lowercase()));
        Ok(Some(FileMetadata {
            name,
            path_lower: Some(path.to_lowercase()),
            path_display: Some(path.to_string()),
            id: None,
            size: bytes.len() as u64,
            rev: None,
            server_modified: None,
        }))
    }

    async fn delete_entry(&self, path: &str) -> std::result::Result<DeleteResult, RemoteError> {
        let mut state = self.state();
        state.calls.push(Call::Delete(path.to_string()));
        if state.delete_errors.contains(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }

        let parent = state.listings.entry(parent_of(path)).or_default();
        let index = parent
            .iter()
            .position(|e| e.target() == Some(path))
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        let metadata = parent.remove(index);
        Ok(DeleteResult { metadata })
    }

    async fn temporary_link(&self, path: &str) -> std::result::Result<String, RemoteError> {
        let mut state = self.state();
        state.calls.push(Call::Link(path.to_string()));
        if state.link_errors.contains(path) {
            return Err(RemoteError::NotFound(path.to_string()));
        }
        Ok(format!("https://dl.example.com{}", path))
    }

    async fn download_folder_archive(&self, path: &str) -> std::result::Result<Vec<u8>, RemoteError> {
        let mut state = self.state();
        state.calls.push(Call::Archive(path.to_string()));
        if state.archive_errors.contains(path) {
            return Err(RemoteError::Connection("reset".into()));
        }
        Ok(format!("zip:{}", path).into_bytes())
    }
}

/// Records every notice
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(|p| p.into_inner()).push(notice);
    }
}

/// Records navigation requests without moving anywhere
#[derive(Default, Clone)]
pub struct RecordingNavigator {
    requests: Arc<Mutex<Vec<NavigationRequest>>>,
}

impl RecordingNavigator {
    pub fn requests(&self) -> Vec<NavigationRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, request: NavigationRequest) {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);
    }
}

/// Records opened links and saved archives
#[derive(Default, Clone)]
pub struct RecordingSink {
    opened: Arc<Mutex<Vec<String>>>,
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingSink {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl LinkOpener for RecordingSink {
    fn open(&self, link: &str) -> Result<()> {
        self.opened.lock().unwrap_or_else(|p| p.into_inner()).push(link.to_string());
        Ok(())
    }
}

#[async_trait]
impl ArchiveSink for RecordingSink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        self.saved
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((file_name.to_string(), bytes));
        Ok(())
    }
}
