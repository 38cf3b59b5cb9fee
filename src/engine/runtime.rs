// src/engine/runtime.rs

//! HTTP shell around [`SceneRouter`].
//!
//! The router runs as middleware: scene bundle requests are answered from
//! the current build, everything else falls through to a static file
//! service. All scene semantics live in the router; this module only
//! translates between HTTP and router results.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerSection;
use crate::errors::{Result, ScenewatchError};

use super::router::SceneRouter;

pub const SCRIPT_CONTENT_TYPE: &str = "text/javascript; charset=utf-8";

/// Build the axum application: scene middleware in front of `static_dir`.
pub fn app(router: Arc<SceneRouter>, static_dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn_with_state(router, scene_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn scene_middleware(
    State(router): State<Arc<SceneRouter>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    match router.serve(&path).await {
        None => next.run(request).await,
        Some(Ok(artifact)) => (
            [(header::CONTENT_TYPE, SCRIPT_CONTENT_TYPE)],
            artifact.content.clone(),
        )
            .into_response(),
        Some(Err(err)) => error_response(&path, &err),
    }
}

fn error_response(path: &str, err: &ScenewatchError) -> Response {
    let status = match err {
        ScenewatchError::ReservedScene(_) | ScenewatchError::InvalidScene(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(path, status = status.as_u16(), error = %err, "scene request failed");
    (status, err.to_string()).into_response()
}

/// Bind `server.host:server.port` and serve until Ctrl-C.
///
/// The current scene watcher is disposed on the way out.
pub async fn run_server(server: &ServerSection, router: Arc<SceneRouter>) -> Result<()> {
    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        static_dir = ?server.static_dir,
        "scenewatch listening"
    );

    let app = app(Arc::clone(&router), &server.static_dir);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    router.shutdown();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
