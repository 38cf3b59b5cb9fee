// src/engine/mod.rs

//! Request handling for scenewatch.
//!
//! - [`router`] decides which scene a request is for, owns the single
//!   current scene watcher and awaits its build.
//! - [`runtime`] is the async HTTP shell (axum) that feeds requests into the
//!   router and falls back to static files.

pub mod router;
pub mod runtime;

pub use router::{parse_scene_path, SceneRouter};
pub use runtime::{app, run_server, SCRIPT_CONTENT_TYPE};
