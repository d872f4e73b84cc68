//! Sandbox module - Confined execution and path resolution
//!
//! - `path`: resolves caller-supplied relative paths against a sandbox root
//! - `process`: runs commands and interpreter invocations under resource limits
//! - `limits`: the resource ceilings applied to each child process
//! - `executor`: request/result types and the `CodeExecutor` seam

mod executor;
mod limits;
pub mod path;
mod process;

pub use executor::{CodeExecutor, ExecutionRequest, ExecutionResult, LimitViolation, Program};
pub use limits::{ResourceLimits, MIB};
pub use process::ProcessSandbox;

use std::sync::Arc;

use crate::config::SandboxConfig;

/// Create the executor described by the configuration
pub fn create_executor(config: &SandboxConfig) -> Arc<dyn CodeExecutor> {
    Arc::new(ProcessSandbox::from_config(config))
}
