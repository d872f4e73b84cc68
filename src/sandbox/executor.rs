//! Common executor trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::limits::ResourceLimits;
use crate::error::Result;

/// Which program a request runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Program {
    /// A shell command line, run with `sh -c`
    Shell { command: String },
    /// The configured Python interpreter with the given arguments
    Python { args: Vec<String> },
}

/// Request to execute something inside a sandbox root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// What to run
    pub program: Program,
    /// Standard input
    #[serde(default)]
    pub stdin: Option<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Resource ceilings
    #[serde(default)]
    pub limits: ResourceLimits,
}

impl ExecutionRequest {
    /// Run a shell command line
    pub fn shell(command: impl Into<String>) -> Self {
        ExecutionRequest {
            program: Program::Shell {
                command: command.into(),
            },
            stdin: None,
            env: HashMap::new(),
            limits: ResourceLimits::default(),
        }
    }

    /// Run the Python interpreter with arguments
    pub fn python<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExecutionRequest {
            program: Program::Python {
                args: args.into_iter().map(Into::into).collect(),
            },
            stdin: None,
            env: HashMap::new(),
            limits: ResourceLimits::default(),
        }
    }

    /// Set stdin
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Set resource limits
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Add environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Which ceiling a process ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitViolation {
    /// Killed by the wall-clock timeout
    WallTime,
    /// Ran out of CPU time
    CpuTime,
    /// Ran out of memory
    Memory,
}

impl std::fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitViolation::WallTime => write!(f, "Timeout"),
            LimitViolation::CpuTime => write!(f, "CPU time limit exceeded"),
            LimitViolation::Memory => write!(f, "Memory limit exceeded"),
        }
    }
}

/// Result of one sandboxed invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Terminating signal, if the process was killed
    pub signal: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Limit the process ran into, if any
    pub violation: Option<LimitViolation>,
    /// Stdout was cut at the output cap
    pub stdout_truncated: bool,
    /// Stderr was cut at the output cap
    pub stderr_truncated: bool,
    /// Wall time spent
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl ExecutionResult {
    /// Exited with status zero and hit no limit
    pub fn success(&self) -> bool {
        self.violation.is_none() && self.exit_code == Some(0)
    }

    /// Whether the wall-clock timeout fired
    pub fn timed_out(&self) -> bool {
        self.violation == Some(LimitViolation::WallTime)
    }

    /// Either stream was truncated
    pub fn truncated(&self) -> bool {
        self.stdout_truncated || self.stderr_truncated
    }

    /// Human-readable reason the run did not succeed
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(violation) = self.violation {
            return Some(violation.to_string());
        }
        match (self.exit_code, self.signal) {
            (Some(0), _) => None,
            (Some(code), _) => Some(format!("Process exited with status {}", code)),
            (None, Some(signal)) => Some(format!("Process killed by signal {}", signal)),
            (None, None) => Some("Process terminated abnormally".to_string()),
        }
    }
}

/// Trait for execution backends
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    /// Get the executor name
    fn name(&self) -> &str;

    /// Execute a request with `root` as the working directory
    async fn execute(&self, root: &Path, request: ExecutionRequest) -> Result<ExecutionResult>;
}
