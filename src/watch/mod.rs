// src/watch/mod.rs

//! File watching and scene build lifecycle.
//!
//! This module is responsible for:
//! - Deciding which changed files count as scene sources (`patterns`).
//! - Wiring the cross-platform filesystem watcher from `notify` behind the
//!   [`crate::fs::ChangeNotifier`] seam (`watcher`).
//! - The per-scene debounce / expiry state machine (`scene`).
//!
//! It does **not** know about HTTP or request paths; the router in
//! [`crate::engine`] decides which scene is being watched.

pub mod path_utils;
pub mod patterns;
pub mod scene;
pub mod watcher;

pub use patterns::SourceFilter;
pub use scene::{
    BuildFn, SceneWatcher, WatchContext, WatchTimings, BUILD_WINDOW, COMPILE_DELAY, EXPIRY,
};
pub use watcher::NotifyChangeNotifier;
