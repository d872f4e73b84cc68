//! Error types for Sessionbox

use thiserror::Error;

/// Result type alias using Sessionbox's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sessionbox
///
/// Failures of *user* code (non-zero exits, exceptions, limit violations) are
/// never represented here; they travel as data inside
/// [`ExecutionResult`](crate::sandbox::ExecutionResult) and
/// [`EvaluationReport`](crate::eval::EvaluationReport).
#[derive(Error, Debug)]
pub enum Error {
    /// A relative path tried to leave its sandbox root
    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    /// Missing file or rename/delete target
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session directory does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Malformed request payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The service failed to spawn or supervise a child process
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::PathTraversal(_)
                | Error::InvalidInput(_)
                | Error::NotFound(_)
                | Error::SessionNotFound(_)
        )
    }

    /// Check if error means the addressed thing does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::SessionNotFound(_))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("Background task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(Error::PathTraversal("../x".into()).is_client_error());
        assert!(Error::SessionNotFound("abc".into()).is_client_error());
        assert!(!Error::Sandbox("spawn".into()).is_client_error());
        assert!(!Error::Io(std::io::Error::other("disk")).is_client_error());
    }

    #[test]
    fn test_not_found() {
        assert!(Error::NotFound("a.txt".into()).is_not_found());
        assert!(Error::SessionNotFound("s".into()).is_not_found());
        assert!(!Error::InvalidInput("x".into()).is_not_found());
    }
}
