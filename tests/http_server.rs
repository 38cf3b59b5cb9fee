// tests/http_server.rs
//
// The axum app driven as a tower service: scene bundles from the router,
// other paths from the static directory.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use scenewatch::engine::{app, SCRIPT_CONTENT_TYPE};
use scenewatch::fs::mock::MockNotifier;
use scenewatch_test_utils::builders::{self, ConfigFileBuilder};
use scenewatch_test_utils::fake_compiler::FakeCompiler;
use scenewatch_test_utils::{init_tracing, with_timeout};

const ALPHA: &str = "/scenes/alpha/alpha-scene.min.js";

struct Harness {
    app: Router,
    compiler: FakeCompiler,
    _static_dir: TempDir,
}

fn harness() -> Harness {
    init_tracing();
    let static_dir = TempDir::new().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>scenes</h1>").unwrap();

    let cfg = ConfigFileBuilder::new().build();
    let compiler = FakeCompiler::new();
    let router = Arc::new(builders::router(&cfg, &compiler, &MockNotifier::new()));

    Harness {
        app: app(router, static_dir.path()),
        compiler,
        _static_dir: static_dir,
    }
}

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

async fn get(h: &Harness, path: &str) -> Reply {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = with_timeout(h.app.clone().oneshot(request)).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply {
        status,
        content_type,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

#[tokio::test]
async fn scene_bundle_is_served_as_javascript() {
    let h = harness();

    let reply = get(&h, ALPHA).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.content_type.as_deref(), Some(SCRIPT_CONTENT_TYPE));
    assert_eq!(reply.body, "alpha build 1");
    assert_eq!(h.compiler.calls(), 1);

    let reply = get(&h, ALPHA).await;
    assert_eq!(reply.body, "alpha build 1");
    assert_eq!(h.compiler.calls(), 1);
}

#[tokio::test]
async fn reserved_scene_is_a_bad_request() {
    let h = harness();

    let reply = get(&h, "/scenes/shared/shared-scene.min.js").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(h.compiler.calls(), 0);
}

#[tokio::test]
async fn build_failure_is_a_server_error() {
    let h = harness();
    h.compiler.fail_next(1);

    let reply = get(&h, ALPHA).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.body.contains("fake compile error"), "{}", reply.body);

    let reply = get(&h, ALPHA).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn other_paths_fall_through_to_static_files() {
    let h = harness();

    let reply = get(&h, "/index.html").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "<h1>scenes</h1>");

    let reply = get(&h, "/scenes/alpha/beta-scene.min.js").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(h.compiler.calls(), 0);
}
