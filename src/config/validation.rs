//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_sandbox_config(config, result);
    result = validate_limits_config(config, result);
    result = validate_evaluator_config(config, result);

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if !config.sandbox.base_dir.is_absolute() {
        result = result.with_error(
            ValidationIssue::new("sandbox.base_dir", "must be an absolute path")
                .with_suggestion("e.g. /tmp/genie_repl"),
        );
    }

    if which::which(&config.sandbox.python).is_err() {
        result = result.with_warning(
            ValidationIssue::new(
                "sandbox.python",
                format!("interpreter '{}' not found on PATH", config.sandbox.python),
            )
            .with_suggestion("install python3 or set SESSIONBOX_PYTHON"),
        );
    }

    if config.sandbox.run_as_uid.is_some() != config.sandbox.run_as_gid.is_some() {
        result = result.with_warning(ValidationIssue::new(
            "sandbox.run_as_uid",
            "run_as_uid and run_as_gid are usually set together",
        ));
    }

    result
}

fn validate_limits_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if let Err(message) = config.run.validate() {
        result = result.with_error(ValidationIssue::new("run", message));
    }
    if config.run.cpu_time.is_none() && config.run.memory_mb.is_none() {
        result = result.with_warning(ValidationIssue::new(
            "run",
            "neither cpu_time nor memory_mb is limited for commands",
        ));
    }
    result
}

fn validate_evaluator_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let evaluator = &config.evaluator;

    if let Err(message) = evaluator.limits.validate() {
        result = result.with_error(ValidationIssue::new("evaluator.limits", message));
    }
    if evaluator.max_workers == 0 {
        result = result.with_error(
            ValidationIssue::new("evaluator.max_workers", "must be at least 1")
                .with_suggestion("unset it to use the number of CPUs"),
        );
    }
    if !(evaluator.float_rel_tolerance >= 0.0) || !(evaluator.float_abs_tolerance >= 0.0) {
        result = result.with_error(ValidationIssue::new(
            "evaluator.float_rel_tolerance",
            "tolerances must be non-negative numbers",
        ));
    }

    result
}
