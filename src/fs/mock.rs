// src/fs/mock.rs

use super::{ChangeEvent, ChangeHandler, ChangeKind, ChangeNotifier, Subscription};
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct MockSubscription {
    dir: PathBuf,
    recursive: bool,
    handler: ChangeHandler,
}

impl fmt::Debug for MockSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSubscription")
            .field("dir", &self.dir)
            .field("recursive", &self.recursive)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u64,
    active: HashMap<u64, MockSubscription>,
    missing: HashSet<PathBuf>,
    subscribe_calls: usize,
}

/// In-memory [`ChangeNotifier`]: events are delivered only when a test calls
/// [`MockNotifier::emit`].
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    state: Arc<Mutex<MockState>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later `subscribe` for `dir` fail as if it did not exist.
    pub fn mark_missing(&self, dir: impl Into<PathBuf>) {
        self.lock().missing.insert(dir.into());
    }

    /// Deliver a `Modify` event for `rel_path` to every live subscription on
    /// `dir`. Returns the number of handlers invoked.
    pub fn emit(&self, dir: impl AsRef<Path>, rel_path: &str) -> usize {
        self.emit_kind(dir, rel_path, ChangeKind::Modify)
    }

    pub fn emit_kind(&self, dir: impl AsRef<Path>, rel_path: &str, kind: ChangeKind) -> usize {
        let dir = dir.as_ref();
        // Handlers run outside the lock so they may re-enter the notifier.
        let handlers: Vec<ChangeHandler> = self
            .lock()
            .active
            .values()
            .filter(|s| s.dir == dir)
            .map(|s| Arc::clone(&s.handler))
            .collect();
        for handler in &handlers {
            handler(ChangeEvent::new(kind, rel_path));
        }
        handlers.len()
    }

    /// Directories with at least one live subscription, sorted.
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock().active.values().map(|s| s.dir.clone()).collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }

    pub fn is_watching(&self, dir: impl AsRef<Path>) -> bool {
        let dir = dir.as_ref();
        self.lock().active.values().any(|s| s.dir == dir)
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    /// Total number of `subscribe` calls, successful or not.
    pub fn subscribe_calls(&self) -> usize {
        self.lock().subscribe_calls
    }
}

impl ChangeNotifier for MockNotifier {
    fn subscribe(
        &self,
        dir: &Path,
        recursive: bool,
        handler: ChangeHandler,
    ) -> Result<Subscription> {
        let mut state = self.lock();
        state.subscribe_calls += 1;
        if state.missing.contains(dir) {
            return Err(anyhow!("No such directory: {:?}", dir));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.active.insert(
            id,
            MockSubscription {
                dir: dir.to_path_buf(),
                recursive,
                handler,
            },
        );

        let shared = Arc::clone(&self.state);
        Ok(Subscription::new(dir, move || {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .active
                .remove(&id);
        }))
    }
}
