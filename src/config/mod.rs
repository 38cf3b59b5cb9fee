// src/config/mod.rs

//! Configuration loading and validation for scenewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate durations, patterns and timing order (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CompilerSection, ConfigFile, RawConfigFile, ScenesSection, ServerSection, WatchSection,
    WatchSettings,
};
pub use validate::parse_duration;
