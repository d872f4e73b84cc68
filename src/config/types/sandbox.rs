//! Sandbox configuration types
//!
//! Where session directories live, which interpreter runs user code, and how
//! code evaluation is scheduled and compared.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::sandbox::ResourceLimits;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory holding one subdirectory per session
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Python interpreter (name on PATH or absolute path)
    #[serde(default = "default_python")]
    pub python: String,
    /// Drop to this uid before exec (only honoured when running as root)
    #[serde(default)]
    pub run_as_uid: Option<u32>,
    /// Drop to this gid before exec (only honoured when running as root)
    #[serde(default)]
    pub run_as_gid: Option<u32>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            base_dir: default_base_dir(),
            python: default_python(),
            run_as_uid: None,
            run_as_gid: None,
        }
    }
}

fn default_base_dir() -> PathBuf {
    crate::config::paths::default_base_dir()
}

fn default_python() -> String {
    "python3".to_string()
}

/// Code evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Limits for each case and for the initial load check; unset fields
    /// come from [`ResourceLimits::per_case`]
    #[serde(
        default = "ResourceLimits::per_case",
        deserialize_with = "ResourceLimits::deserialize_per_case"
    )]
    pub limits: ResourceLimits,
    /// Cases running at once within one evaluation
    #[serde(default = "default_workers")]
    pub max_workers: usize,
    /// Relative tolerance for float comparison
    #[serde(default = "default_rel_tolerance")]
    pub float_rel_tolerance: f64,
    /// Absolute tolerance for float comparison
    #[serde(default)]
    pub float_abs_tolerance: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig {
            limits: ResourceLimits::per_case(),
            max_workers: default_workers(),
            float_rel_tolerance: default_rel_tolerance(),
            float_abs_tolerance: 0.0,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_rel_tolerance() -> f64 {
    1e-9
}
