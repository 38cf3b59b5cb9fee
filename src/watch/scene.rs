// src/watch/scene.rs

//! Per-scene build lifecycle.
//!
//! A [`SceneWatcher`] starts watching its scene's sources on the first
//! [`SceneWatcher::build`] call. Every `build` call:
//! - keeps the watch alive for another `expiry`,
//! - opens a `build_window` during which source changes trigger a
//!   debounced rebuild without anyone asking for it.
//!
//! Outside the window a change only drops the cached build; the next `build`
//! call compiles on demand. After `expiry` without a `build` call the watcher
//! disposes itself.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace};

use crate::errors::{Result, ScenewatchError};
use crate::exec::BuildFuture;
use crate::fs::{ChangeEvent, ChangeHandler, ChangeNotifier, Subscription};
use crate::types::SceneId;
use crate::watch::patterns::SourceFilter;

/// Rebuild automatically on change for this long after an access.
pub const BUILD_WINDOW: Duration = Duration::from_secs(15);
/// Keep watching (without rebuilding) for this long after an access.
pub const EXPIRY: Duration = Duration::from_secs(120);
/// Quiet period between the last change and the rebuild it triggers.
pub const COMPILE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    pub build_window: Duration,
    pub expiry: Duration,
    pub compile_delay: Duration,
}

impl Default for WatchTimings {
    fn default() -> Self {
        Self {
            build_window: BUILD_WINDOW,
            expiry: EXPIRY,
            compile_delay: COMPILE_DELAY,
        }
    }
}

/// Stand-in for "never" when `now + window` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(window).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Everything watchers share regardless of scene.
#[derive(Debug, Clone)]
pub struct WatchContext {
    pub notifier: Arc<dyn ChangeNotifier>,
    pub filter: SourceFilter,
    pub timings: WatchTimings,
}

/// Starts a fresh build of the watcher's scene.
pub type BuildFn = Arc<dyn Fn() -> BuildFuture + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum TimerKind {
    Rebuild,
    Expiry,
}

/// A pending timer. `seq` identifies it so that a timer which already woke
/// up but was replaced before it got the lock does nothing.
struct ScheduledTask {
    seq: u64,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct WatcherState {
    cached_build: Option<BuildFuture>,
    build_deadline: Option<Instant>,
    rebuild_timer: Option<ScheduledTask>,
    expiry_timer: Option<ScheduledTask>,
    subscriptions: Option<Vec<Subscription>>,
    next_seq: u64,
}

impl WatcherState {
    /// Back to idle. The subscriptions are handed back so the caller can
    /// release them after dropping the state lock.
    fn reset(&mut self) -> Option<Vec<Subscription>> {
        if let Some(timer) = self.rebuild_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = self.expiry_timer.take() {
            timer.cancel();
        }
        self.cached_build = None;
        self.build_deadline = None;
        self.subscriptions.take()
    }
}

struct WatcherInner {
    scene: SceneId,
    watch_dirs: Vec<PathBuf>,
    build_fn: BuildFn,
    ctx: WatchContext,
    state: Mutex<WatcherState>,
}

impl WatcherInner {
    fn lock(&self) -> MutexGuard<'_, WatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_build(&self, state: &mut WatcherState) -> BuildFuture {
        if let Some(build) = &state.cached_build {
            // A failed build is never served twice.
            if !matches!(build.peek(), Some(Err(_))) {
                return build.clone();
            }
            debug!(scene = %self.scene, "discarding failed build");
        }
        let build = (self.build_fn)();
        state.cached_build = Some(build.clone());
        build
    }

    fn schedule(
        self: &Arc<Self>,
        state: &mut WatcherState,
        kind: TimerKind,
        delay: Duration,
    ) -> ScheduledTask {
        state.next_seq += 1;
        let seq = state.next_seq;
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(kind, seq);
            }
        });
        ScheduledTask { seq, handle }
    }

    fn fire(&self, kind: TimerKind, seq: u64) {
        let mut state = self.lock();
        match kind {
            TimerKind::Rebuild => {
                if !state.rebuild_timer.as_ref().is_some_and(|t| t.seq == seq) {
                    return;
                }
                // Our own handle: dropping it detaches rather than aborts.
                state.rebuild_timer = None;
                debug!(scene = %self.scene, "starting debounced rebuild");
                let _ = self.ensure_build(&mut state);
            }
            TimerKind::Expiry => {
                if !state.expiry_timer.as_ref().is_some_and(|t| t.seq == seq) {
                    return;
                }
                state.expiry_timer = None;
                let subscriptions = state.reset();
                drop(state);
                drop(subscriptions);
                info!(
                    scene = %self.scene,
                    idle_secs = self.ctx.timings.expiry.as_secs(),
                    "scene not requested recently; stopped watching"
                );
            }
        }
    }

    fn on_change(self: &Arc<Self>, event: &ChangeEvent) {
        if !self.ctx.filter.matches(&event.path) {
            trace!(scene = %self.scene, path = %event.path, "ignoring non-source change");
            return;
        }

        let mut state = self.lock();
        if state.subscriptions.is_none() {
            // Late event from a subscription that is being released.
            return;
        }

        state.cached_build = None;

        match state.build_deadline {
            Some(deadline) if Instant::now() < deadline => {
                let timer = self.schedule(
                    &mut state,
                    TimerKind::Rebuild,
                    self.ctx.timings.compile_delay,
                );
                if let Some(previous) = state.rebuild_timer.replace(timer) {
                    previous.cancel();
                }
                debug!(
                    scene = %self.scene,
                    path = %event.path,
                    kind = ?event.kind,
                    "source changed; rebuild scheduled"
                );
            }
            _ => {
                debug!(
                    scene = %self.scene,
                    path = %event.path,
                    "source changed outside build window; next request rebuilds"
                );
            }
        }
    }

    fn subscribe_all(self: &Arc<Self>) -> Result<Vec<Subscription>> {
        let weak = Arc::downgrade(self);
        let handler: ChangeHandler = Arc::new(move |event: ChangeEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(&event);
            }
        });

        // On error the subscriptions made so far are dropped, i.e. released.
        self.watch_dirs
            .iter()
            .map(|dir| {
                self.ctx
                    .notifier
                    .subscribe(dir, true, Arc::clone(&handler))
                    .map_err(|e| ScenewatchError::Watch(format!("{e:#}")))
            })
            .collect()
    }
}

impl Drop for WatcherInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.reset();
    }
}

/// Build lifecycle of one scene. Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct SceneWatcher {
    inner: Arc<WatcherInner>,
}

impl fmt::Debug for SceneWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneWatcher")
            .field("scene", &self.inner.scene)
            .field("watching", &self.is_watching())
            .field("cached", &self.has_cached_build())
            .finish_non_exhaustive()
    }
}

impl SceneWatcher {
    /// `watch_dirs` are subscribed recursively on first use, typically the
    /// scene's own directory and the shared one.
    pub fn new(
        scene: SceneId,
        watch_dirs: Vec<PathBuf>,
        build_fn: BuildFn,
        ctx: WatchContext,
    ) -> Self {
        Self {
            inner: Arc::new(WatcherInner {
                scene,
                watch_dirs,
                build_fn,
                ctx,
                state: Mutex::new(WatcherState::default()),
            }),
        }
    }

    pub fn scene(&self) -> &SceneId {
        &self.inner.scene
    }

    /// Current build of this scene, starting one if needed.
    ///
    /// Starts watching on first use; a directory that cannot be watched is
    /// reported here. Must be called inside a Tokio runtime.
    pub fn build(&self) -> Result<BuildFuture> {
        let inner = &self.inner;
        let mut state = inner.lock();

        if state.subscriptions.is_none() {
            state.subscriptions = Some(inner.subscribe_all()?);
            debug!(scene = %inner.scene, dirs = ?inner.watch_dirs, "subscribed to scene sources");
        }

        if let Some(timer) = state.rebuild_timer.take() {
            timer.cancel();
        }
        let expiry = inner.schedule(&mut state, TimerKind::Expiry, inner.ctx.timings.expiry);
        if let Some(previous) = state.expiry_timer.replace(expiry) {
            previous.cancel();
        }

        state.build_deadline = Some(deadline_after(inner.ctx.timings.build_window));
        Ok(inner.ensure_build(&mut state))
    }

    /// Stop watching and forget the cached build. Safe to call repeatedly.
    ///
    /// An in-flight compile keeps running but its result is no longer
    /// referenced here.
    pub fn dispose(&self) {
        let subscriptions = self.inner.lock().reset();
        if let Some(subscriptions) = subscriptions {
            drop(subscriptions);
            debug!(scene = %self.inner.scene, "scene watcher disposed");
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner.lock().subscriptions.is_some()
    }

    pub fn has_cached_build(&self) -> bool {
        self.inner.lock().cached_build.is_some()
    }

    pub fn rebuild_scheduled(&self) -> bool {
        self.inner.lock().rebuild_timer.is_some()
    }

    /// End of the current automatic-rebuild window, if any.
    pub fn build_deadline(&self) -> Option<Instant> {
        self.inner.lock().build_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BuildError;
    use crate::fs::mock::MockNotifier;
    use crate::types::{BuildArtifact, BuildMode, DEFAULT_SHARED_SCENE};
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Build function resolving immediately, counting invocations.
    fn counting_build(calls: &Arc<AtomicUsize>, fail: bool) -> BuildFn {
        let calls = Arc::clone(calls);
        Arc::new(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if fail {
                    Err(BuildError {
                        scene: "alpha".to_string(),
                        message: "boom".to_string(),
                    })
                } else {
                    Ok(Arc::new(BuildArtifact::new(format!("build {n}"), BuildMode::Compiled)))
                }
            }
            .boxed()
            .shared()
        })
    }

    fn watcher(notifier: &MockNotifier, build_fn: BuildFn) -> SceneWatcher {
        watcher_with(notifier, build_fn, WatchTimings::default())
    }

    fn watcher_with(
        notifier: &MockNotifier,
        build_fn: BuildFn,
        timings: WatchTimings,
    ) -> SceneWatcher {
        SceneWatcher::new(
            SceneId::parse("alpha", DEFAULT_SHARED_SCENE).unwrap(),
            vec![PathBuf::from("scenes/alpha"), PathBuf::from("scenes/shared")],
            build_fn,
            WatchContext {
                notifier: Arc::new(notifier.clone()),
                filter: SourceFilter::default(),
                timings,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_build_subscribes_to_scene_and_shared() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, false));

        assert!(!w.is_watching());
        let artifact = w.build().unwrap().await.unwrap();
        assert_eq!(artifact.content, "build 1");
        assert_eq!(
            notifier.watched_dirs(),
            vec![PathBuf::from("scenes/alpha"), PathBuf::from("scenes/shared")]
        );

        // Cached: no second compile, no second subscription.
        w.build().unwrap().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscribe_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ignored_paths_keep_the_cache() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, false));
        w.build().unwrap().await.unwrap();

        notifier.emit("scenes/alpha", "alpha-scene.min.js");
        notifier.emit("scenes/alpha", "notes.txt");
        assert!(w.has_cached_build());
        assert!(!w.rebuild_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_build_is_retried_on_next_access() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, true));

        assert!(w.build().unwrap().await.is_err());
        assert!(w.build().unwrap().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_failure_surfaces_and_releases_partial_watch() {
        let notifier = MockNotifier::new();
        notifier.mark_missing("scenes/shared");
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, false));

        match w.build() {
            Err(ScenewatchError::Watch(msg)) => assert!(msg.contains("scenes/shared")),
            Err(other) => panic!("expected Watch error, got {other:?}"),
            Ok(_) => panic!("expected Watch error, got a build"),
        }
        assert_eq!(notifier.active_count(), 0);
        assert!(!w.is_watching());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_is_idempotent() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, false));

        w.dispose();
        w.build().unwrap().await.unwrap();
        w.dispose();
        w.dispose();
        assert!(!w.is_watching());
        assert!(!w.has_cached_build());
        assert!(w.build_deadline().is_none());
        assert_eq!(notifier.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_last_handle_releases_subscriptions() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let w = watcher(&notifier, counting_build(&calls, false));
        w.build().unwrap().await.unwrap();
        assert_eq!(notifier.active_count(), 2);

        drop(w);
        assert_eq!(notifier.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_window_keeps_rebuilding() {
        let notifier = MockNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let timings = WatchTimings {
            build_window: Duration::MAX,
            expiry: Duration::MAX,
            compile_delay: COMPILE_DELAY,
        };
        let w = watcher_with(&notifier, counting_build(&calls, false), timings);

        w.build().unwrap().await.unwrap();
        assert!(w.build_deadline().is_some());

        notifier.emit("scenes/alpha", "app.js");
        assert!(w.rebuild_scheduled());
        sleep(COMPILE_DELAY + Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(w.is_watching());
    }
}
