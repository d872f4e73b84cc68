//! Route handlers
//!
//! Each handler validates the session id, resolves the session root and
//! delegates to the file manager, sandbox or evaluator.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use tracing::debug;

use super::error::AppError;
use super::types::*;
use super::AppState;
use crate::eval::EvaluationReport;
use crate::sandbox::ExecutionRequest;
use crate::session::SessionId;

type ApiResult<T> = std::result::Result<Json<T>, AppError>;

pub async fn ping() -> Json<&'static str> {
    Json("ping")
}

pub async fn evaluate_code(
    State(state): State<AppState>,
    payload: Result<Json<EvaluateCodeRequest>, JsonRejection>,
) -> ApiResult<EvaluationReport> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;
    let root = state.store.get_or_create(&id).await?;

    let report = state
        .evaluator
        .evaluate(&root, &req.code, &req.entry_point, &req.io_cases)
        .await?;
    Ok(Json(report))
}

pub async fn run_command(
    State(state): State<AppState>,
    payload: Result<Json<RunCommandRequest>, JsonRejection>,
) -> ApiResult<RunCommandResponse> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;
    let root = state.store.get_or_create(&id).await?;

    debug!("Running command in session {}: {}", id, req.cmd);
    let request = ExecutionRequest::shell(req.cmd).with_limits(state.run_limits.clone());
    let result = state.executor.execute(&root, request).await?;

    Ok(Json(RunCommandResponse {
        truncated: result.truncated(),
        stdout: result.stdout,
        stderr: result.stderr,
        id: id.into(),
        exit_code: result.exit_code,
        violation: result.violation,
    }))
}

pub async fn read_file(
    State(state): State<AppState>,
    query: Result<Query<ReadFileQuery>, QueryRejection>,
) -> ApiResult<ReadFileResponse> {
    let Query(query) = query?;
    let id = SessionId::parse(query.id)?;
    let root = state.store.get_or_create(&id).await?;

    let content = state.files.read(&root, &query.rel_path).await?;
    Ok(Json(ReadFileResponse {
        content,
        id: id.into(),
        rel_path: query.rel_path,
    }))
}

pub async fn write_file(
    State(state): State<AppState>,
    payload: Result<Json<WriteFileRequest>, JsonRejection>,
) -> ApiResult<FileActionResponse> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;
    let root = state.store.get_or_create(&id).await?;

    state.files.write(&root, &req.rel_path, &req.content).await?;
    Ok(Json(FileActionResponse {
        success: true,
        id: id.into(),
        rel_path: req.rel_path,
    }))
}

pub async fn delete_file(
    State(state): State<AppState>,
    payload: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> ApiResult<FileActionResponse> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;
    let root = state.store.get_or_create(&id).await?;

    state.files.delete(&root, &req.rel_path).await?;
    Ok(Json(FileActionResponse {
        success: true,
        id: id.into(),
        rel_path: req.rel_path,
    }))
}

pub async fn rename_file(
    State(state): State<AppState>,
    payload: Result<Json<RenameFileRequest>, JsonRejection>,
) -> ApiResult<RenameFileResponse> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;
    let root = state.store.get_or_create(&id).await?;

    state
        .files
        .rename(&root, &req.old_path, &req.new_path)
        .await?;
    Ok(Json(RenameFileResponse {
        success: true,
        id: id.into(),
        old_path: req.old_path,
        new_path: req.new_path,
    }))
}

pub async fn fork_session(
    State(state): State<AppState>,
    payload: Result<Json<ForkSessionRequest>, JsonRejection>,
) -> ApiResult<ForkSessionResponse> {
    let Json(req) = payload?;
    let id = SessionId::parse(req.id)?;

    let new_id = state.store.fork(&id).await?;
    Ok(Json(ForkSessionResponse {
        new_id: new_id.into(),
    }))
}
