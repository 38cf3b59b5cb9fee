#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use scenewatch::config::{ConfigFile, RawConfigFile};
use scenewatch::engine::SceneRouter;
use scenewatch::exec::{BuildObserver, BuildWorker, CompileSettings};
use scenewatch::fs::mock::MockNotifier;

use crate::fake_compiler::FakeCompiler;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with a placeholder compiler command, so
/// `build()` always yields a valid config unless a setter breaks it.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.compiler.cmd = "cat {dir}/main.js".to_string();
        Self { config }
    }

    pub fn scenes_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.scenes.root = root.into();
        self
    }

    pub fn shared(mut self, token: &str) -> Self {
        self.config.scenes.shared = token.to_string();
        self
    }

    pub fn minify(mut self, val: bool) -> Self {
        self.config.compiler.minify = val;
        self
    }

    pub fn build_window(mut self, dur: &str) -> Self {
        self.config.watch.build_window = dur.to_string();
        self
    }

    pub fn expiry(mut self, dur: &str) -> Self {
        self.config.watch.expiry = dur.to_string();
        self
    }

    pub fn compile_delay(mut self, dur: &str) -> Self {
        self.config.watch.compile_delay = dur.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker over `compiler` using the scene settings from `cfg`.
pub fn worker(cfg: &ConfigFile, compiler: &FakeCompiler) -> BuildWorker {
    BuildWorker::new(Arc::new(compiler.clone()), CompileSettings::from_config(cfg))
}

pub fn worker_with_observer(
    cfg: &ConfigFile,
    compiler: &FakeCompiler,
    observer: BuildObserver,
) -> BuildWorker {
    BuildWorker::with_observer(
        Arc::new(compiler.clone()),
        CompileSettings::from_config(cfg),
        observer,
    )
}

/// Router wired to a fake compiler and a mock notifier.
pub fn router(cfg: &ConfigFile, compiler: &FakeCompiler, notifier: &MockNotifier) -> SceneRouter {
    SceneRouter::from_config(cfg, worker(cfg, compiler), Arc::new(notifier.clone()))
}
