//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, ServerConfig, LogConfig)
//! - types/sandbox.rs: Sandbox and evaluator configuration
//! - io.rs: Configuration loading
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
pub(crate) mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{Config, LogConfig, LogFormat, ServerConfig};

// Re-export sandbox types
pub use types::sandbox::{EvaluatorConfig, SandboxConfig};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path, parse_config};
pub use paths::{config_dir, config_path, default_base_dir};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
