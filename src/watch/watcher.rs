// src/watch/watcher.rs

use std::path::Path;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::fs::{ChangeEvent, ChangeHandler, ChangeKind, ChangeNotifier, Subscription};
use crate::watch::path_utils::relative_str;

/// [`ChangeNotifier`] backed by the platform watcher from `notify`.
///
/// Each subscription owns its own `RecommendedWatcher` plus a Tokio task that
/// moves events from notify's callback thread into the async world and calls
/// the handler there. `subscribe` must therefore run inside a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyChangeNotifier;

impl NotifyChangeNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeNotifier for NotifyChangeNotifier {
    fn subscribe(
        &self,
        dir: &Path,
        recursive: bool,
        handler: ChangeHandler,
    ) -> Result<Subscription> {
        // Canonicalize once so event paths can be relativized reliably.
        let root = dir
            .canonicalize()
            .with_context(|| format!("cannot watch {:?}", dir))?;

        // Channel from the blocking notify callback into the async world.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    // A closed receiver only means the subscription is being
                    // released.
                    let _ = event_tx.send(event);
                }
                Err(err) => {
                    warn!("file watch error: {err}");
                }
            },
            Config::default(),
        )
        .context("creating file watcher")?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&root, mode)
            .with_context(|| format!("cannot watch {:?}", root))?;

        debug!(dir = ?root, recursive, "file watcher started");

        let task_root = root.clone();
        let forward = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                // Reads (including the compiler's own) must not count as edits.
                if matches!(event.kind, EventKind::Access(_)) {
                    continue;
                }
                let kind = ChangeKind::from(&event.kind);
                for path in &event.paths {
                    match relative_str(&task_root, path) {
                        Some(rel) => handler(ChangeEvent::new(kind, rel)),
                        None => debug!(
                            ?path,
                            root = ?task_root,
                            "ignoring event outside watched directory"
                        ),
                    }
                }
            }
            debug!(dir = ?task_root, "file watcher event loop finished");
        });

        let sub_dir = root.clone();
        Ok(Subscription::new(sub_dir, move || {
            drop(watcher);
            forward.abort();
            debug!(dir = ?root, "file watcher stopped");
        }))
    }
}
