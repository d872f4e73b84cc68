//! Code evaluator
//!
//! Runs one solution against many input/output cases. Every case is a fresh
//! sandboxed interpreter process, so a crash, infinite loop or memory blowup
//! in one case cannot affect the others or the service.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::harness::{
    parse_outcome, HarnessRequest, Outcome, HARNESS_FILE, HARNESS_SOURCE, SOLUTION_FILE,
};
use super::input::{parse_call_args, CallArgs};
use super::literal::{Literal, Tolerance};
use crate::config::EvaluatorConfig;
use crate::error::{Error, Result};
use crate::sandbox::{CodeExecutor, ExecutionRequest, ExecutionResult, LimitViolation, ResourceLimits};

/// Directory (relative to the sandbox root) holding evaluation workspaces
pub const WORKSPACE_DIR: &str = ".sessionbox";

/// How much of a failing process's stderr is quoted in an error
const STDERR_TAIL: usize = 2000;

/// One test case: argument source text and expected result source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCase {
    pub input: String,
    pub output: String,
}

impl IoCase {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        IoCase {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Index in the submitted case list
    pub case: usize,
    pub input: String,
    pub expected: String,
    /// `repr()` of the returned value
    pub got: Option<String>,
    pub passed: bool,
    pub error: Option<String>,
    pub violation: Option<LimitViolation>,
}

impl CaseResult {
    fn failed(case: usize, io: &IoCase, error: String, violation: Option<LimitViolation>) -> Self {
        CaseResult {
            case,
            input: io.input.clone(),
            expected: io.output.clone(),
            got: None,
            passed: false,
            error: Some(error),
            violation,
        }
    }
}

/// Aggregate outcome of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Every case passed
    pub passed: bool,
    /// Per-case results, in submission order
    pub case_results: Vec<CaseResult>,
    /// Set when the code could not be loaded at all
    pub error: Option<String>,
}

/// Evaluates code against test cases through a [`CodeExecutor`]
#[derive(Clone)]
pub struct CodeEvaluator {
    executor: Arc<dyn CodeExecutor>,
    limits: ResourceLimits,
    max_workers: usize,
    tolerance: Tolerance,
}

impl std::fmt::Debug for CodeEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEvaluator")
            .field("executor", &self.executor.name())
            .field("limits", &self.limits)
            .field("max_workers", &self.max_workers)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl CodeEvaluator {
    pub fn new(executor: Arc<dyn CodeExecutor>) -> Self {
        CodeEvaluator {
            executor,
            limits: ResourceLimits::per_case(),
            max_workers: 4,
            tolerance: Tolerance::default(),
        }
    }

    pub fn from_config(executor: Arc<dyn CodeExecutor>, config: &EvaluatorConfig) -> Self {
        CodeEvaluator::new(executor)
            .with_limits(config.limits.clone())
            .with_max_workers(config.max_workers)
            .with_tolerance(Tolerance {
                relative: config.float_rel_tolerance,
                absolute: config.float_abs_tolerance,
            })
    }

    /// Limits applied to every case and to the load check
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Cases in flight at once (at least one)
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Run `code` against `io_cases`, calling `entry_point` once per case
    pub async fn evaluate(
        &self,
        root: &Path,
        code: &str,
        entry_point: &str,
        io_cases: &[IoCase],
    ) -> Result<EvaluationReport> {
        let entry_point = entry_point.trim();
        validate_entry_point(entry_point)?;

        let workspace = Workspace::create(root, code).await?;
        debug!(
            "Evaluating {} against {} case(s) in {}",
            entry_point,
            io_cases.len(),
            workspace.path().display()
        );

        let report = self
            .run_cases(root, &workspace.path().join(HARNESS_FILE), entry_point, io_cases)
            .await;
        workspace.remove().await;

        let report = report?;
        info!(
            "Evaluated {}: {}/{} case(s) passed",
            entry_point,
            report.case_results.iter().filter(|c| c.passed).count(),
            report.case_results.len()
        );
        Ok(report)
    }

    async fn run_cases(
        &self,
        root: &Path,
        harness: &Path,
        entry_point: &str,
        io_cases: &[IoCase],
    ) -> Result<EvaluationReport> {
        // Load failures are reported once instead of once per case.
        let loaded = self.invoke(root, harness, entry_point, None).await?;
        if let Err((error, _)) = interpret(&loaded.0, loaded.1) {
            let case_results = io_cases
                .iter()
                .enumerate()
                .map(|(i, io)| CaseResult::failed(i, io, format!("not run: {}", error), None))
                .collect();
            return Ok(EvaluationReport {
                passed: false,
                case_results,
                error: Some(error),
            });
        }

        let pending: Vec<_> = io_cases
            .iter()
            .enumerate()
            .map(|(i, io)| self.run_case(root, harness, entry_point, i, io))
            .collect();
        let case_results: Vec<CaseResult> = stream::iter(pending)
            .buffered(self.max_workers)
            .collect()
            .await;

        Ok(EvaluationReport {
            passed: case_results.iter().all(|c| c.passed),
            case_results,
            error: None,
        })
    }

    async fn run_case(
        &self,
        root: &Path,
        harness: &Path,
        entry_point: &str,
        case: usize,
        io: &IoCase,
    ) -> CaseResult {
        let args = parse_call_args(&io.input);
        let (result, outcome) = match self.invoke(root, harness, entry_point, Some(&args)).await {
            Ok(invocation) => invocation,
            Err(e) => return CaseResult::failed(case, io, e.to_string(), None),
        };

        match interpret(&result, outcome) {
            Ok(got) => {
                let got = got.unwrap_or_else(|| "None".to_string());
                CaseResult {
                    case,
                    input: io.input.clone(),
                    expected: io.output.clone(),
                    passed: outputs_match(&io.output, &got, &self.tolerance),
                    got: Some(got),
                    error: None,
                    violation: None,
                }
            }
            Err((error, violation)) => CaseResult::failed(case, io, error, violation),
        }
    }

    async fn invoke(
        &self,
        root: &Path,
        harness: &Path,
        entry_point: &str,
        args: Option<&CallArgs>,
    ) -> Result<(ExecutionResult, Option<Outcome>)> {
        let nonce = Uuid::new_v4().simple().to_string();
        let request = match args {
            Some(args) => HarnessRequest::call(entry_point, &nonce, args),
            None => HarnessRequest::load(entry_point, &nonce),
        };
        let stdin = serde_json::to_string(&request)?;

        let execution = ExecutionRequest::python(["-B".to_string(), harness.to_string_lossy().into_owned()])
            .with_stdin(stdin)
            .with_limits(self.limits.clone());
        let result = self.executor.execute(root, execution).await?;
        let outcome = parse_outcome(&result.stdout, &nonce);
        Ok((result, outcome))
    }
}

/// Returned repr, or the error text and limit hit
fn interpret(
    result: &ExecutionResult,
    outcome: Option<Outcome>,
) -> std::result::Result<Option<String>, (String, Option<LimitViolation>)> {
    if let Some(violation) = result.violation {
        return Err((violation.to_string(), Some(violation)));
    }
    match outcome {
        Some(Outcome::Returned(repr)) => Ok(repr),
        Some(Outcome::Raised { error, traceback }) => {
            if traceback.is_empty() {
                Err((error, None))
            } else {
                Err((format!("{}\n{}", error, traceback.trim_end()), None))
            }
        }
        None => {
            let reason = result
                .failure_reason()
                .unwrap_or_else(|| "Process produced no result".to_string());
            let stderr = stderr_tail(&result.stderr);
            if stderr.is_empty() {
                Err((reason, None))
            } else {
                Err((format!("{}\n{}", reason, stderr), None))
            }
        }
    }
}

fn stderr_tail(stderr: &str) -> &str {
    let trimmed = stderr.trim_end();
    if trimmed.len() <= STDERR_TAIL {
        return trimmed;
    }
    let mut start = trimmed.len() - STDERR_TAIL;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}

/// Compare expected source text with an actual repr
///
/// Both sides are parsed as literals and compared structurally; if either
/// does not parse, the trimmed texts must be identical.
pub fn outputs_match(expected: &str, actual: &str, tolerance: &Tolerance) -> bool {
    match (Literal::parse(expected), Literal::parse(actual)) {
        (Ok(expected), Ok(actual)) => expected.equivalent(&actual, tolerance),
        _ => expected.trim() == actual.trim(),
    }
}

/// Entry points are dotted names, optionally with empty-call segments
/// (`solve`, `Solution().two_sum`, `mod.Cls.method`)
fn validate_entry_point(entry_point: &str) -> Result<()> {
    if entry_point.is_empty() {
        return Err(Error::InvalidInput("entry_point must not be empty".into()));
    }

    let valid = entry_point.split('.').all(|segment| {
        let name = segment.strip_suffix("()").unwrap_or(segment);
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
    });

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "entry_point '{}' is not a dotted name",
            entry_point
        )))
    }
}

/// Per-evaluation directory holding the solution and harness
///
/// Removed by [`Workspace::remove`], or synchronously on drop when the
/// evaluation is cancelled part way.
struct Workspace {
    dir: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Write the solution and harness into a fresh workspace under `root`
    async fn create(root: &Path, code: &str) -> Result<Self> {
        let dir = root
            .join(WORKSPACE_DIR)
            .join(format!("eval-{}", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&dir).await?;
        let workspace = Workspace {
            dir,
            removed: false,
        };
        tokio::fs::write(workspace.dir.join(SOLUTION_FILE), code).await?;
        tokio::fs::write(workspace.dir.join(HARNESS_FILE), HARNESS_SOURCE).await?;
        Ok(workspace)
    }

    fn path(&self) -> &Path {
        &self.dir
    }

    async fn remove(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!(
                "Failed to remove evaluation workspace {}: {}",
                self.dir.display(),
                e
            );
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!("Removed abandoned workspace {}", self.dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove evaluation workspace {}: {}",
                self.dir.display(),
                e
            ),
        }
    }
}
