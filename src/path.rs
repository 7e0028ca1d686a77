//! Path forms used at each boundary
//!
//! Navigation uses a leading-slash form with `/` as the root. The storage
//! service wants the empty string for the root. Conversions here are pure.

use std::fmt;

/// Route prefix the file manager is mounted under in the browser location
pub const LOCATION_PREFIX: &str = "/files";

/// Archive name used when a folder path has no last segment
const DEFAULT_ARCHIVE_NAME: &str = "archive";

/// Convert a navigation-form path to the form the storage service expects.
///
/// Only the root changes (`/` becomes `""`); every other path is passed
/// through untouched.
pub fn storage_path(path: &str) -> &str {
    if path == "/" {
        ""
    } else {
        path
    }
}

/// Normalized navigation path (`/`, `/docs`, `/docs/reports`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize a navigation path: empty and `/` mean root, duplicate and
    /// trailing slashes are dropped, a leading slash is added.
    pub fn from_navigation(path: &str) -> Self {
        let joined = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            Self::root()
        } else {
            Self(format!("/{}", joined))
        }
    }

    /// Extract the folder path from a browser location such as
    /// `/files/docs/My%20Reports`. Anything outside the route prefix is the root.
    pub fn from_location(location: &str) -> Self {
        let location = location.split(['?', '#']).next().unwrap_or_default();
        let rest = match location.strip_prefix(LOCATION_PREFIX) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Self::root(),
        };
        let decoded = urlencoding::decode(rest)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| rest.to_string());
        Self::from_navigation(&decoded)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Navigation form: `/` for the root
    pub fn as_navigation(&self) -> &str {
        if self.is_root() {
            "/"
        } else {
            &self.0
        }
    }

    /// Storage-service form: `""` for the root
    pub fn to_storage(&self) -> &str {
        &self.0
    }

    /// Destination path of a file named `name` inside this folder
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{}", self.0, name.trim_matches('/')))
    }

    /// Folder containing this path; `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let end = self.0.rfind('/').unwrap_or(0);
        Some(Self(self.0[..end].to_string()))
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// File name a folder archive is saved under
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.last_segment().unwrap_or(DEFAULT_ARCHIVE_NAME))
    }

    /// Browser location linking to this folder
    pub fn location(&self) -> String {
        format!("{}{}", LOCATION_PREFIX, self.0)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_navigation())
    }
}

impl From<&str> for RemotePath {
    fn from(path: &str) -> Self {
        Self::from_navigation(path)
    }
}
