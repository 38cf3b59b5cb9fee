#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::Semaphore;

use scenewatch::exec::{CompileRequest, SceneCompiler};
use scenewatch::types::{BuildArtifact, BuildMode};

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    pending_failures: AtomicUsize,
    requests: Mutex<Vec<CompileRequest>>,
}

/// A compiler that never spawns anything:
/// - counts invocations and records each request,
/// - produces `"<scene> build <n>"`, where `n` is the invocation number,
/// - optionally sleeps on the Tokio clock (pausable in tests),
/// - optionally blocks until the test calls [`FakeCompiler::release`],
/// - optionally fails the next N invocations.
///
/// Clones share counters and gate.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    counters: Arc<Counters>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every compile takes `delay` of Tokio time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every compile waits for one [`release`](Self::release) permit.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` gated compiles finish.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Make the next `n` compiles fail.
    pub fn fail_next(&self, n: usize) {
        self.counters.pending_failures.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompileRequest> {
        self.counters.requests.lock().unwrap().clone()
    }

    /// Names of the scenes compiled so far, in order.
    pub fn scenes(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.scene.to_string())
            .collect()
    }

    fn take_failure(&self) -> bool {
        self.counters
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl SceneCompiler for FakeCompiler {
    fn compile(
        &self,
        request: CompileRequest,
        minify: bool,
    ) -> Pin<Box<dyn Future<Output = Result<BuildArtifact>> + Send + '_>> {
        let n = self.counters.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.requests.lock().unwrap().push(request.clone());
        let fail = self.take_failure();

        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(gate) = &self.gate {
                gate.acquire().await?.forget();
            }
            if fail {
                return Err(anyhow!("fake compile error in {}", request.scene));
            }
            let mode = if minify {
                BuildMode::Compiled
            } else {
                BuildMode::Transpiled
            };
            Ok(BuildArtifact::new(format!("{} build {n}", request.scene), mode))
        })
    }
}
