// src/types.rs

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, ScenewatchError};

/// Default token naming the directory of resources shared by every scene.
pub const DEFAULT_SHARED_SCENE: &str = "shared";

static SCENE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("scene name pattern is valid")
});

/// Returns true if `name` is syntactically usable as a scene token.
pub fn is_scene_token(name: &str) -> bool {
    SCENE_NAME.is_match(name)
}

/// Name of a scene, i.e. one compilation unit under the scenes root.
///
/// Construction goes through [`SceneId::parse`], so a `SceneId` is never the
/// reserved shared-resources token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(String);

impl SceneId {
    pub fn parse(name: &str, reserved: &str) -> Result<Self> {
        if !is_scene_token(name) {
            return Err(ScenewatchError::InvalidScene(name.to_string()));
        }
        if name == reserved {
            return Err(ScenewatchError::ReservedScene(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the compiler produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Fully compiled (optimised / minified).
    Compiled,
    /// Only transpiled; faster but unoptimised.
    Transpiled,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Compiled => f.write_str("compiled"),
            BuildMode::Transpiled => f.write_str("transpiled"),
        }
    }
}

/// Output of one compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub content: String,
    pub mode: BuildMode,
}

impl BuildArtifact {
    pub fn new(content: impl Into<String>, mode: BuildMode) -> Self {
        Self {
            content: content.into(),
            mode,
        }
    }
}
