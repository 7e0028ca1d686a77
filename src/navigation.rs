//! Navigation requests and an in-memory history stack
//!
//! The view never owns the history. It asks a [`Navigator`] to move and
//! learns about the new location through `DirectoryView::on_path_change`.

use std::sync::Mutex;

use crate::path::RemotePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Go to a folder
    To(RemotePath),
    /// Move through history (-1 back, +1 forward)
    Offset(isize),
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, request: NavigationRequest);
}

#[derive(Debug)]
struct HistoryInner {
    entries: Vec<RemotePath>,
    index: usize,
    requests: Vec<NavigationRequest>,
}

/// Browser-like back/forward stack
#[derive(Debug)]
pub struct History {
    inner: Mutex<HistoryInner>,
}

impl History {
    pub fn new(start: RemotePath) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![start],
                index: 0,
                requests: Vec::new(),
            }),
        }
    }

    pub fn current(&self) -> RemotePath {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.entries[inner.index].clone()
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.index + 1 < inner.entries.len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<NavigationRequest> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).requests.clone()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(RemotePath::root())
    }
}

impl Navigator for History {
    fn navigate(&self, request: NavigationRequest) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match &request {
            NavigationRequest::To(path) => {
                if inner.entries[inner.index] != *path {
                    let keep = inner.index + 1;
                    inner.entries.truncate(keep);
                    inner.entries.push(path.clone());
                    inner.index = keep;
                }
            }
            NavigationRequest::Offset(offset) => {
                // Out-of-range offsets are ignored, as browsers do
                let target = inner.index as isize + offset;
                if target >= 0 && (target as usize) < inner.entries.len() {
                    inner.index = target as usize;
                }
            }
        }
        inner.requests.push(request);
    }
}
