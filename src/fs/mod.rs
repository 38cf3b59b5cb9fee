// src/fs/mod.rs

//! Filesystem change notification seam.
//!
//! Scene watchers never talk to `notify` directly; they go through
//! [`ChangeNotifier`], which hands back a [`Subscription`]. Production code
//! uses [`crate::watch::NotifyChangeNotifier`]; tests use
//! [`mock::MockNotifier`] and fire events by hand.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

pub mod mock;

/// Coarse classification of a filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Modify,
    Remove,
    Other,
}

impl From<&notify::EventKind> for ChangeKind {
    fn from(kind: &notify::EventKind) -> Self {
        match kind {
            notify::EventKind::Create(_) => ChangeKind::Create,
            notify::EventKind::Modify(_) => ChangeKind::Modify,
            notify::EventKind::Remove(_) => ChangeKind::Remove,
            _ => ChangeKind::Other,
        }
    }
}

/// A single change under a subscribed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Path relative to the subscribed directory, with forward slashes.
    pub path: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Callback invoked for every change until the subscription is released.
pub type ChangeHandler = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Live registration with a [`ChangeNotifier`].
///
/// Released by [`Subscription::cancel`] or on drop, whichever comes first.
/// After release the handler is not invoked again.
pub struct Subscription {
    dir: PathBuf,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(dir: impl Into<PathBuf>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            dir: dir.into(),
            release: Some(Box::new(release)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cancel(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("dir", &self.dir)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Source of filesystem change events.
pub trait ChangeNotifier: Send + Sync + fmt::Debug {
    /// Start delivering changes under `dir` to `handler`.
    ///
    /// Fails if `dir` cannot be watched (e.g. it does not exist).
    fn subscribe(&self, dir: &Path, recursive: bool, handler: ChangeHandler)
    -> Result<Subscription>;
}
