//! HTTP gateway
//!
//! ```text
//! GET  /                 -> "ping"
//! POST /evaluate_code    -> EvaluationReport
//! POST /run              -> RunCommandResponse
//! GET  /read_file        -> ReadFileResponse
//! POST /write_file       -> FileActionResponse
//! POST /delete_file      -> FileActionResponse
//! POST /rename_file      -> RenameFileResponse
//! POST /fork_session     -> ForkSessionResponse
//! ```
//!
//! Errors are `{"detail": "..."}` with 400 for rejected input, 404 for
//! missing files or sessions, 500 otherwise.

mod error;
mod handlers;
pub mod types;

pub use error::AppError;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::CodeEvaluator;
use crate::files::FileManager;
use crate::sandbox::{create_executor, CodeExecutor, ResourceLimits};
use crate::session::SessionStore;

/// Shared, cheaply cloneable handler state
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub files: FileManager,
    pub executor: Arc<dyn CodeExecutor>,
    pub evaluator: CodeEvaluator,
    /// Limits for `/run`
    pub run_limits: ResourceLimits,
}

impl AppState {
    pub fn new(
        store: SessionStore,
        executor: Arc<dyn CodeExecutor>,
        evaluator: CodeEvaluator,
        run_limits: ResourceLimits,
    ) -> Self {
        AppState {
            store,
            files: FileManager::new(),
            executor,
            evaluator,
            run_limits,
        }
    }

    /// Open the session store and build the executor from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SessionStore::open_at(config.sandbox.base_dir.clone()).await?;
        let executor = create_executor(&config.sandbox);
        let evaluator = CodeEvaluator::from_config(executor.clone(), &config.evaluator);
        info!(
            "Using {} executor, sessions under {}",
            executor.name(),
            store.base_dir().display()
        );
        Ok(AppState::new(store, executor, evaluator, config.run.clone()))
    }
}

/// Build the router
pub fn build_router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(handlers::ping))
        .route("/evaluate_code", post(handlers::evaluate_code))
        .route("/run", post(handlers::run_command))
        .route("/read_file", get(handlers::read_file))
        .route("/write_file", post(handlers::write_file))
        .route("/delete_file", post(handlers::delete_file))
        .route("/rename_file", post(handlers::rename_file))
        .route("/fork_session", post(handlers::fork_session))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve the API until ctrl-c
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config).await?;
    let app = build_router(state, config.server.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e| {
            Error::Config(format!(
                "Invalid listen address {}:{}: {}",
                config.server.bind, config.server.port, e
            ))
        })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::IoCase;
    use crate::sandbox::ProcessSandbox;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open_at(dir.path()).await.unwrap();
        let executor: Arc<dyn CodeExecutor> = Arc::new(ProcessSandbox::new("python3"));
        let evaluator = CodeEvaluator::new(executor.clone())
            .with_limits(ResourceLimits::per_case().with_memory_mb(512));
        let run_limits = ResourceLimits::default().with_wall_time(Duration::from_secs(2));
        let state = AppState::new(store, executor, evaluator, run_limits);
        (build_router(state, false), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_ping() {
        let (app, _dir) = app().await;
        let (status, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ping"));
    }

    #[tokio::test]
    async fn test_file_lifecycle() {
        let (app, _dir) = app().await;

        let (status, body) = post(
            &app,
            "/write_file",
            json!({"id": "s1", "rel_path": "src/a.txt", "content": "hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "id": "s1", "rel_path": "src/a.txt"}));

        let (status, body) = get(&app, "/read_file?id=s1&rel_path=src/a.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "hello");

        let (status, body) = post(
            &app,
            "/rename_file",
            json!({"id": "s1", "old_path": "src/a.txt", "new_path": "b/c.txt"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["new_path"], "b/c.txt");

        let (status, _) = get(&app, "/read_file?id=s1&rel_path=src/a.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = post(&app, "/delete_file", json!({"id": "s1", "rel_path": "b/c.txt"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            post(&app, "/delete_file", json!({"id": "s1", "rel_path": "b/c.txt"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("b/c.txt"));
    }

    #[tokio::test]
    async fn test_traversal_is_bad_request() {
        let (app, dir) = app().await;

        let (status, body) = post(
            &app,
            "/write_file",
            json!({"id": "s1", "rel_path": "../escape.txt", "content": "x"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("traversal"));
        assert!(!dir.path().join("escape.txt").exists());

        let (status, _) = get(&app, "/read_file?id=s1&rel_path=%2Fetc%2Fpasswd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (app, _dir) = app().await;

        let (status, body) = post(&app, "/run", json!({"id": "../x", "cmd": "true"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, body) = post(&app, "/write_file", json!({"id": "s1"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = get(&app, "/read_file?id=s1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_run_command() {
        let (app, _dir) = app().await;

        post(&app, "/write_file", json!({"id": "r1", "rel_path": "in.txt", "content": "abc"})).await;
        let (status, body) = post(&app, "/run", json!({"id": "r1", "cmd": "cat in.txt; echo err >&2; exit 3"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stdout"], "abc");
        assert_eq!(body["stderr"], "err\n");
        assert_eq!(body["exit_code"], 3);
        assert_eq!(body["id"], "r1");
        assert_eq!(body["violation"], Value::Null);
        assert_eq!(body["truncated"], false);
    }

    #[tokio::test]
    async fn test_run_timeout_is_reported() {
        let (app, _dir) = app().await;

        let (status, body) = post(&app, "/run", json!({"id": "t1", "cmd": "sleep 30"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["violation"], "wall_time");
        assert_eq!(body["exit_code"], Value::Null);
    }

    #[tokio::test]
    async fn test_fork_session() {
        let (app, _dir) = app().await;

        let (status, _) = post(&app, "/fork_session", json!({"id": "nobody"})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        post(&app, "/write_file", json!({"id": "f1", "rel_path": "x.txt", "content": "v1"})).await;
        let (status, body) = post(&app, "/fork_session", json!({"id": "f1"})).await;
        assert_eq!(status, StatusCode::OK);
        let new_id = body["new_id"].as_str().unwrap().to_string();

        post(&app, "/write_file", json!({"id": new_id, "rel_path": "x.txt", "content": "v2"})).await;
        let (_, original) = get(&app, "/read_file?id=f1&rel_path=x.txt").await;
        let (_, forked) = get(&app, &format!("/read_file?id={}&rel_path=x.txt", new_id)).await;
        assert_eq!(original["content"], "v1");
        assert_eq!(forked["content"], "v2");
    }

    #[tokio::test]
    async fn test_evaluate_code() {
        if which::which("python3").is_err() {
            return;
        }
        let (app, _dir) = app().await;

        let cases = vec![IoCase::new("a = 1, b = 2", "3"), IoCase::new("a = 2, b = 2", "5")];
        let (status, body) = post(
            &app,
            "/evaluate_code",
            json!({
                "id": "e1",
                "code": "def add(a, b):\n    return a + b\n",
                "entry_point": "add",
                "io_cases": cases,
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["passed"], false);
        assert_eq!(body["error"], Value::Null);
        assert_eq!(body["case_results"][0]["passed"], true);
        assert_eq!(body["case_results"][1]["got"], "4");
        assert_eq!(body["case_results"][1]["expected"], "5");
    }
}
