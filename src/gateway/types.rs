//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use crate::eval::IoCase;
use crate::sandbox::LimitViolation;

/// `POST /evaluate_code`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateCodeRequest {
    pub id: String,
    pub code: String,
    pub entry_point: String,
    #[serde(default)]
    pub io_cases: Vec<IoCase>,
}

/// `POST /run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCommandRequest {
    pub id: String,
    pub cmd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCommandResponse {
    pub stdout: String,
    pub stderr: String,
    pub id: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub violation: Option<LimitViolation>,
    pub truncated: bool,
}

/// `GET /read_file` query string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileQuery {
    pub id: String,
    pub rel_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub content: String,
    pub id: String,
    pub rel_path: String,
}

/// `POST /write_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub id: String,
    pub rel_path: String,
    pub content: String,
}

/// `POST /delete_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileRequest {
    pub id: String,
    pub rel_path: String,
}

/// Response of write and delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileActionResponse {
    pub success: bool,
    pub id: String,
    pub rel_path: String,
}

/// `POST /rename_file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFileRequest {
    pub id: String,
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFileResponse {
    pub success: bool,
    pub id: String,
    pub old_path: String,
    pub new_path: String,
}

/// `POST /fork_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkSessionRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkSessionResponse {
    pub new_id: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
