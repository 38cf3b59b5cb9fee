// src/engine/router.rs

//! Maps request paths to scene builds.
//!
//! The router keeps exactly one [`SceneWatcher`]: the one for the most
//! recently requested scene. Asking for a different scene disposes it and
//! starts a new one. Keeping several recent watchers would also work; one is
//! enough for a single developer iterating on one scene.

use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use regex::Regex;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, ScenewatchError};
use crate::exec::BuildWorker;
use crate::fs::ChangeNotifier;
use crate::types::{BuildArtifact, SceneId};
use crate::watch::{BuildFn, SceneWatcher, WatchContext};

// No backreferences in `regex`, so both names are captured and compared.
static SCENE_BUNDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/scenes/([A-Za-z0-9_]+)/([A-Za-z0-9_]+)-scene\.min\.js$")
        .expect("scene bundle pattern is valid")
});

/// Match `/scenes/<name>/<name>-scene.min.js`.
///
/// - `None`: not a scene bundle request (including mismatched names); the
///   caller should handle the request some other way.
/// - `Some(Err(ReservedScene))`: the shared-resources directory was asked
///   for as a scene.
/// - `Some(Ok(scene))`: a buildable scene.
pub fn parse_scene_path(path: &str, reserved: &str) -> Option<Result<SceneId>> {
    let caps = SCENE_BUNDLE.captures(path)?;
    let (dir, file) = (&caps[1], &caps[2]);
    if dir != file {
        return None;
    }
    Some(SceneId::parse(dir, reserved))
}

#[derive(Debug)]
pub struct SceneRouter {
    worker: BuildWorker,
    watch: WatchContext,
    scenes_root: PathBuf,
    shared: String,
    current: Mutex<Option<SceneWatcher>>,
}

impl SceneRouter {
    pub fn new(
        worker: BuildWorker,
        watch: WatchContext,
        scenes_root: impl Into<PathBuf>,
        shared: impl Into<String>,
    ) -> Self {
        Self {
            worker,
            watch,
            scenes_root: scenes_root.into(),
            shared: shared.into(),
            current: Mutex::new(None),
        }
    }

    pub fn from_config(
        cfg: &ConfigFile,
        worker: BuildWorker,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        let watch = WatchContext {
            notifier,
            filter: cfg.watch.filter.clone(),
            timings: cfg.watch.timings,
        };
        Self::new(worker, watch, &cfg.scenes.root, &cfg.scenes.shared)
    }

    fn lock(&self) -> MutexGuard<'_, Option<SceneWatcher>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve a request path.
    ///
    /// Returns `None` when `path` is not a scene bundle, so the caller can
    /// pass the request on. Otherwise returns the scene's current build, or
    /// the error that prevented it.
    pub async fn serve(&self, path: &str) -> Option<Result<Arc<BuildArtifact>>> {
        let scene = match parse_scene_path(path, &self.shared)? {
            Ok(scene) => scene,
            Err(err) => return Some(Err(err)),
        };
        Some(self.build_scene(&scene).await)
    }

    /// Make `scene` the current scene and await its build.
    pub async fn build_scene(&self, scene: &SceneId) -> Result<Arc<BuildArtifact>> {
        if scene.as_str() == self.shared {
            return Err(ScenewatchError::ReservedScene(self.shared.clone()));
        }
        let build = self.watcher_for(scene).build()?;
        Ok(build.await?)
    }

    fn watcher_for(&self, scene: &SceneId) -> SceneWatcher {
        let mut current = self.lock();
        if let Some(watcher) = current.as_ref() {
            if watcher.scene() == scene {
                return watcher.clone();
            }
        }

        if let Some(previous) = current.take() {
            debug!(previous = %previous.scene(), next = %scene, "switching watched scene");
            previous.dispose();
        }

        info!(scene = %scene, "watching scene");
        let worker = self.worker.clone();
        let bound = scene.clone();
        let build_fn: BuildFn = Arc::new(move || worker.run(&bound));
        let watcher = SceneWatcher::new(
            scene.clone(),
            vec![
                self.scenes_root.join(scene.as_str()),
                self.scenes_root.join(&self.shared),
            ],
            build_fn,
            self.watch.clone(),
        );
        *current = Some(watcher.clone());
        watcher
    }

    /// Scene of the current watcher, if any.
    pub fn current_scene(&self) -> Option<SceneId> {
        self.lock().as_ref().map(|w| w.scene().clone())
    }

    pub fn current_watcher(&self) -> Option<SceneWatcher> {
        self.lock().clone()
    }

    /// Dispose the current watcher, e.g. on server shutdown.
    pub fn shutdown(&self) {
        if let Some(watcher) = self.lock().take() {
            watcher.dispose();
        }
    }
}
