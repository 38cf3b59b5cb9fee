// src/exec/backend.rs

//! Pluggable compiler abstraction.
//!
//! The build worker talks to a [`SceneCompiler`] instead of spawning
//! processes itself. Production code uses
//! [`CommandCompiler`](super::command::CommandCompiler); tests provide
//! fakes that count invocations and decide when a compile finishes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;

use crate::types::{BuildArtifact, SceneId};

/// Everything a compiler needs to know about one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub scene: SceneId,
    pub entry_point: String,
    pub scene_dir: PathBuf,
}

/// Trait abstracting how a scene bundle is produced.
pub trait SceneCompiler: Send + Sync {
    /// Compile `request`. May take arbitrarily long; a failure is reported
    /// to every caller waiting on this compile.
    fn compile(
        &self,
        request: CompileRequest,
        minify: bool,
    ) -> Pin<Box<dyn Future<Output = Result<BuildArtifact>> + Send + '_>>;
}
