// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::DEFAULT_SHARED_SCENE;
use crate::watch::{SourceFilter, WatchTimings};

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [server]
/// port = 8080
/// static_dir = "static"
///
/// [scenes]
/// root = "scenes"
/// entry_point = "app.Game"
///
/// [compiler]
/// cmd = "npx esbuild {dir}/main.js --bundle"
///
/// [watch]
/// build_window = "15s"
/// ```
///
/// All sections are optional, but `[compiler].cmd` has no usable default, so
/// validation rejects a config that leaves it empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub scenes: ScenesSection,

    #[serde(default)]
    pub compiler: CompilerSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, so
/// durations are parsed and glob patterns are compiled.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub scenes: ScenesSection,
    pub compiler: CompilerSection,
    pub watch: WatchSettings,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerSection,
        scenes: ScenesSection,
        compiler: CompilerSection,
        watch: WatchSettings,
    ) -> Self {
        Self {
            server,
            scenes,
            compiler,
            watch,
        }
    }

    /// Directory holding sources shared by all scenes.
    pub fn shared_dir(&self) -> PathBuf {
        self.scenes.root.join(&self.scenes.shared)
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Root for every request that is not a scene bundle.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// `[scenes]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenesSection {
    /// Directory containing one sub-directory per scene.
    #[serde(default = "default_scenes_root")]
    pub root: PathBuf,

    /// Name of the sub-directory shared by every scene. It can never be
    /// requested as a scene itself.
    #[serde(default = "default_shared")]
    pub shared: String,

    /// Entry point handed to the compiler as `{entry}`.
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
}

fn default_scenes_root() -> PathBuf {
    PathBuf::from("scenes")
}

fn default_shared() -> String {
    DEFAULT_SHARED_SCENE.to_string()
}

fn default_entry_point() -> String {
    "app.Game".to_string()
}

impl Default for ScenesSection {
    fn default() -> Self {
        Self {
            root: default_scenes_root(),
            shared: default_shared(),
            entry_point: default_entry_point(),
        }
    }
}

/// `[compiler]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerSection {
    /// Shell command printing the bundle on stdout.
    ///
    /// `{scene}`, `{entry}` and `{dir}` are substituted before running.
    #[serde(default)]
    pub cmd: String,

    /// Whether to ask for a fully optimised build. Artifacts built with
    /// `minify = true` are reported as compiled, otherwise as transpiled.
    #[serde(default)]
    pub minify: bool,
}

/// `[watch]` section.
///
/// Durations are strings like `"15s"` or `"500ms"`.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// After an access, changes trigger a rebuild for this long.
    #[serde(default = "default_build_window")]
    pub build_window: String,

    /// With no access for this long, the scene stops being watched.
    #[serde(default = "default_expiry")]
    pub expiry: String,

    /// Quiet period after the last change before rebuilding.
    #[serde(default = "default_compile_delay")]
    pub compile_delay: String,

    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

fn default_build_window() -> String {
    "15s".to_string()
}

fn default_expiry() -> String {
    "120s".to_string()
}

fn default_compile_delay() -> String {
    "1s".to_string()
}

fn default_include() -> Vec<String> {
    vec!["**/*.js".to_string()]
}

fn default_exclude() -> Vec<String> {
    vec!["**/*.min.js".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            build_window: default_build_window(),
            expiry: default_expiry(),
            compile_delay: default_compile_delay(),
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

/// Validated form of `[watch]`.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub timings: WatchTimings,
    pub filter: SourceFilter,
}
