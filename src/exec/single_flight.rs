// src/exec/single_flight.rs

//! Single-flight build worker.
//!
//! At most one compile runs per scene at any time. Callers arriving while a
//! compile is in flight get a clone of the same shared future; once it
//! settles the entry is removed, so neither successes nor failures are
//! cached at this layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::BuildError;
use crate::exec::backend::{CompileRequest, SceneCompiler};
use crate::types::{BuildArtifact, SceneId};

pub type BuildResult = std::result::Result<Arc<BuildArtifact>, BuildError>;

/// A compile that any number of callers can await.
pub type BuildFuture = Shared<BoxFuture<'static, BuildResult>>;

/// Called after every successful compile with the time it took.
pub type BuildObserver = Arc<dyn Fn(&SceneId, &BuildArtifact, Duration) + Send + Sync>;

/// Default observer: one `info` line per build.
pub fn log_build(scene: &SceneId, artifact: &BuildArtifact, elapsed: Duration) {
    info!(
        scene = %scene,
        mode = %artifact.mode,
        elapsed_ms = elapsed.as_millis() as u64,
        bytes = artifact.content.len(),
        "scene built"
    );
}

/// Static inputs for every [`CompileRequest`].
#[derive(Debug, Clone)]
pub struct CompileSettings {
    pub scenes_root: PathBuf,
    pub entry_point: String,
    pub minify: bool,
}

impl CompileSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            scenes_root: cfg.scenes.root.clone(),
            entry_point: cfg.scenes.entry_point.clone(),
            minify: cfg.compiler.minify,
        }
    }

    pub fn request_for(&self, scene: &SceneId) -> CompileRequest {
        CompileRequest {
            scene: scene.clone(),
            entry_point: self.entry_point.clone(),
            scene_dir: self.scenes_root.join(scene.as_str()),
        }
    }
}

struct InFlight {
    generation: u64,
    build: BuildFuture,
}

struct WorkerInner {
    compiler: Arc<dyn SceneCompiler>,
    settings: CompileSettings,
    observer: BuildObserver,
    in_flight: Mutex<HashMap<SceneId, InFlight>>,
    next_generation: AtomicU64,
}

impl WorkerInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<SceneId, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the in-flight entry for `scene`, unless a newer compile has
    /// already replaced it.
    fn settle(&self, scene: &SceneId, generation: u64) {
        let mut in_flight = self.lock();
        if in_flight
            .get(scene)
            .is_some_and(|entry| entry.generation == generation)
        {
            in_flight.remove(scene);
        }
    }
}

/// Removes the in-flight entry when the compile task ends, including when
/// the compiler panics.
struct SettleGuard {
    inner: Arc<WorkerInner>,
    scene: SceneId,
    generation: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.inner.settle(&self.scene, self.generation);
    }
}

/// Shared handle to the build worker. Cloning is cheap; all clones share the
/// same in-flight table.
#[derive(Clone)]
pub struct BuildWorker {
    inner: Arc<WorkerInner>,
}

impl std::fmt::Debug for BuildWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildWorker")
            .field("settings", &self.inner.settings)
            .field("in_flight", &self.inner.lock().len())
            .finish_non_exhaustive()
    }
}

impl BuildWorker {
    pub fn new(compiler: Arc<dyn SceneCompiler>, settings: CompileSettings) -> Self {
        Self::with_observer(compiler, settings, Arc::new(log_build))
    }

    pub fn with_observer(
        compiler: Arc<dyn SceneCompiler>,
        settings: CompileSettings,
        observer: BuildObserver,
    ) -> Self {
        Self {
            inner: Arc::new(WorkerInner {
                compiler,
                settings,
                observer,
                in_flight: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Start a compile of `scene`, or join the one already in flight.
    ///
    /// The compile runs on its own Tokio task, so it makes progress even if
    /// nobody polls the returned future. Must be called inside a runtime.
    pub fn run(&self, scene: &SceneId) -> BuildFuture {
        let mut in_flight = self.inner.lock();
        if let Some(entry) = in_flight.get(scene) {
            debug!(scene = %scene, "joining in-flight build");
            return entry.build.clone();
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let build = self.start(scene.clone(), generation);
        in_flight.insert(
            scene.clone(),
            InFlight {
                generation,
                build: build.clone(),
            },
        );
        build
    }

    /// Whether a compile of `scene` is currently running.
    pub fn is_in_flight(&self, scene: &SceneId) -> bool {
        self.inner.lock().contains_key(scene)
    }

    fn start(&self, scene: SceneId, generation: u64) -> BuildFuture {
        let guard = SettleGuard {
            inner: Arc::clone(&self.inner),
            scene: scene.clone(),
            generation,
        };

        let handle = tokio::spawn(async move {
            let inner = Arc::clone(&guard.inner);
            let request = inner.settings.request_for(&guard.scene);
            let started = Instant::now();
            let result = inner.compiler.compile(request, inner.settings.minify).await;
            let elapsed = started.elapsed();
            let scene = guard.scene.clone();
            drop(guard);

            match result {
                Ok(artifact) => {
                    (inner.observer)(&scene, &artifact, elapsed);
                    Ok(Arc::new(artifact))
                }
                Err(err) => {
                    warn!(scene = %scene, error = %format!("{err:#}"), "scene build failed");
                    Err(BuildError::new(scene.as_str(), &err))
                }
            }
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(BuildError {
                    scene: scene.to_string(),
                    message: format!("build task did not complete: {join_err}"),
                }),
            }
        }
        .boxed()
        .shared()
    }
}
