//! Process-per-invocation sandbox
//!
//! Every invocation is a fresh child process that:
//! - runs with the sandbox root as its working directory and `HOME`
//! - sees a scrubbed environment
//! - leads its own process group, so the whole tree can be killed at once
//! - carries `RLIMIT_CPU` / `RLIMIT_AS` / optional `RLIMIT_NPROC` and
//!   `RLIMIT_FSIZE` ceilings installed between fork and exec
//!
//! The wall-clock limit is enforced here, not by the caller: when it fires the
//! process group receives `SIGKILL`. The group is also killed after a normal
//! exit, and when the `run` future is dropped before completion, so background
//! children never outlive the request.

use async_trait::async_trait;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::executor::{CodeExecutor, ExecutionRequest, ExecutionResult, LimitViolation, Program};
use super::limits::{ResourceLimits, MIB};
use crate::config::SandboxConfig;
use crate::error::{Error, Result};

const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
const SHELL: &str = "/bin/sh";

/// How long to wait for output pipes after the process group was killed
const PIPE_GRACE: Duration = Duration::from_secs(2);

/// Exception name on the last traceback line when the interpreter ran out of memory
const MEMORY_ERROR: &str = "MemoryError";

/// Runs commands and interpreter invocations under resource limits
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    /// Interpreter used for [`Program::Python`]
    python: PathBuf,
    /// `PATH` handed to children
    path_env: String,
    /// Switch to this uid before exec
    run_as_uid: Option<u32>,
    /// Switch to this gid before exec
    run_as_gid: Option<u32>,
}

impl ProcessSandbox {
    /// Create a sandbox using the given interpreter
    pub fn new(python: impl Into<PathBuf>) -> Self {
        ProcessSandbox {
            python: python.into(),
            path_env: std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string()),
            run_as_uid: None,
            run_as_gid: None,
        }
    }

    /// Build from configuration, resolving the interpreter on `PATH`
    pub fn from_config(config: &SandboxConfig) -> Self {
        let python = match which::which(&config.python) {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    "Interpreter '{}' not found on PATH ({}); executions will fail to spawn",
                    config.python, e
                );
                PathBuf::from(&config.python)
            }
        };

        let mut sandbox = ProcessSandbox::new(python);
        if config.run_as_uid.is_some() || config.run_as_gid.is_some() {
            // SAFETY: geteuid has no preconditions.
            if unsafe { libc::geteuid() } == 0 {
                sandbox.run_as_uid = config.run_as_uid;
                sandbox.run_as_gid = config.run_as_gid;
            } else {
                warn!("run_as_uid/run_as_gid configured but service is not root; ignoring");
            }
        }
        sandbox
    }

    /// Interpreter path
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Run a request with `root` as the working directory
    pub async fn run(&self, root: &Path, request: ExecutionRequest) -> Result<ExecutionResult> {
        let limits = request.limits.clone();
        limits.validate().map_err(Error::InvalidInput)?;

        let interpreter = matches!(request.program, Program::Python { .. });
        let (program, args) = match &request.program {
            Program::Shell { command } => {
                (PathBuf::from(SHELL), vec!["-c".to_string(), command.clone()])
            }
            Program::Python { args } => (self.python.clone(), args.clone()),
        };

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(root)
            .env_clear()
            .env("PATH", &self.path_env)
            .env("HOME", root)
            .env("LANG", "C.UTF-8")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONUNBUFFERED", "1")
            .envs(&request.env)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        if let Some(gid) = self.run_as_gid {
            command.gid(gid);
        }
        if let Some(uid) = self.run_as_uid {
            command.uid(uid);
        }

        let rlimits = RlimitSet::from_limits(&limits);
        // SAFETY: the closure only calls getrlimit/setrlimit, which are
        // async-signal-safe, and reads memory allocated before the fork.
        unsafe {
            command.pre_exec(move || rlimits.apply());
        }

        debug!(
            "Spawning {} in sandbox {} (wall={:?}, cpu={:?}, mem={:?}MiB)",
            program.display(),
            root.display(),
            limits.wall_time,
            limits.cpu_time,
            limits.memory_mb
        );

        let start = Instant::now();
        let mut child = command.spawn().map_err(|e| {
            Error::Sandbox(format!("Failed to spawn {}: {}", program.display(), e))
        })?;
        let pid = child.id();
        let mut group = GroupGuard { pid };

        if let (Some(data), Some(mut stdin)) = (request.stdin, child.stdin.take()) {
            // A child that never reads stdin must not block us.
            tokio::spawn(async move {
                let _ = stdin.write_all(data.as_bytes()).await;
            });
        }

        let stdout_task = spawn_reader(child.stdout.take(), limits.max_output_bytes);
        let stderr_task = spawn_reader(child.stderr.take(), limits.max_output_bytes);

        let (status, killed_by_timeout) =
            match tokio::time::timeout(limits.wall_time, child.wait()).await {
                Ok(status) => (
                    status.map_err(|e| Error::Sandbox(format!("Process error: {}", e)))?,
                    false,
                ),
                Err(_) => {
                    warn!("Execution timed out after {:?}", limits.wall_time);
                    kill_group(pid);
                    let status = child
                        .wait()
                        .await
                        .map_err(|e| Error::Sandbox(format!("Process error: {}", e)))?;
                    (status, true)
                }
            };
        let duration = start.elapsed();

        // Reap descendants that are still holding the pipes open.
        kill_group(pid);
        group.disarm();

        let (stdout, stdout_truncated) = collect(stdout_task).await;
        let (stderr, stderr_truncated) = collect(stderr_task).await;

        let violation = classify(
            killed_by_timeout,
            status,
            duration,
            &limits,
            interpreter,
            &stderr,
        );
        if let Some(violation) = violation {
            warn!(
                "Process {} in {} hit a limit: {}",
                program.display(),
                root.display(),
                violation
            );
        }

        Ok(ExecutionResult {
            exit_code: status.code(),
            signal: status.signal(),
            stdout,
            stderr,
            violation,
            stdout_truncated,
            stderr_truncated,
            duration,
        })
    }
}

#[async_trait]
impl CodeExecutor for ProcessSandbox {
    fn name(&self) -> &str {
        "process"
    }

    async fn execute(&self, root: &Path, request: ExecutionRequest) -> Result<ExecutionResult> {
        self.run(root, request).await
    }
}

/// SIGKILL every process in the group led by `pid`
fn kill_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: a negative pid addresses the process group created by
        // `process_group(0)`; PIDs fit in i32 on every supported platform.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
}

/// Kills the process group on drop unless disarmed
///
/// `run` can be cancelled at any await point (a client disconnect drops the
/// handler future); `kill_on_drop` only reaches the group leader.
struct GroupGuard {
    pid: Option<u32>,
}

impl GroupGuard {
    fn disarm(&mut self) {
        self.pid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if self.pid.is_some() {
            debug!("Run cancelled; killing process group {:?}", self.pid);
            kill_group(self.pid);
        }
    }
}

type ReaderTask = Option<JoinHandle<std::io::Result<(Vec<u8>, bool)>>>;

fn spawn_reader<R>(reader: Option<R>, cap: usize) -> ReaderTask
where
    R: AsyncRead + Unpin + Send + 'static,
{
    reader.map(|r| tokio::spawn(read_bounded(r, cap)))
}

async fn collect(task: ReaderTask) -> (String, bool) {
    let Some(mut task) = task else {
        return (String::new(), false);
    };

    match tokio::time::timeout(PIPE_GRACE, &mut task).await {
        Ok(Ok(Ok((bytes, truncated)))) => (String::from_utf8_lossy(&bytes).into_owned(), truncated),
        Ok(Ok(Err(e))) => (format!("[failed to read output: {}]", e), false),
        Ok(Err(e)) => (format!("[output reader failed: {}]", e), false),
        Err(_) => {
            task.abort();
            warn!("Output pipe still open after the process group was killed");
            (String::new(), true)
        }
    }
}

/// Read everything from `reader`, keeping at most `cap` bytes
///
/// The stream is always drained to EOF so the writer never blocks on a full
/// pipe; the flag reports whether anything was dropped.
pub(crate) async fn read_bounded<R>(mut reader: R, cap: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        let room = cap.saturating_sub(kept.len());
        let take = n.min(room);
        kept.extend_from_slice(&buf[..take]);
        if take < n {
            truncated = true;
        }
    }

    Ok((kept, truncated))
}

/// Work out which limit, if any, ended the process
fn classify(
    killed_by_timeout: bool,
    status: ExitStatus,
    duration: Duration,
    limits: &ResourceLimits,
    interpreter: bool,
    stderr: &str,
) -> Option<LimitViolation> {
    if killed_by_timeout {
        return Some(LimitViolation::WallTime);
    }

    match status.signal() {
        Some(libc::SIGXCPU) => return Some(LimitViolation::CpuTime),
        Some(libc::SIGKILL) => {
            // Nobody here sent it: either the RLIMIT_CPU hard limit or the
            // kernel OOM killer.
            if matches!(limits.cpu_time, Some(cpu) if duration >= cpu) {
                return Some(LimitViolation::CpuTime);
            }
            if limits.memory_mb.is_some() {
                return Some(LimitViolation::Memory);
            }
            return None;
        }
        _ => {}
    }

    // Under RLIMIT_AS the interpreter usually dies with a traceback, not a
    // signal. Shell output is arbitrary text and is never trusted for this.
    if !status.success() && interpreter && limits.memory_mb.is_some() && raised_memory_error(stderr)
    {
        return Some(LimitViolation::Memory);
    }

    None
}

/// The last non-empty stderr line is an uncaught `MemoryError`
fn raised_memory_error(stderr: &str) -> bool {
    match stderr.lines().map(str::trim_end).rfind(|line| !line.is_empty()) {
        Some(line) => {
            line == MEMORY_ERROR
                || line
                    .strip_prefix(MEMORY_ERROR)
                    .is_some_and(|rest| rest.starts_with(':'))
        }
        None => false,
    }
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
type RlimitResource = libc::__rlimit_resource_t;
#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
type RlimitResource = libc::c_int;

/// Rlimits computed in the parent and applied in the child before exec
#[derive(Debug, Clone)]
struct RlimitSet {
    entries: Vec<(RlimitResource, u64, u64)>,
}

impl RlimitSet {
    fn from_limits(limits: &ResourceLimits) -> Self {
        let mut entries = Vec::new();
        if let Some((soft, hard)) = limits.cpu_rlimit() {
            entries.push((libc::RLIMIT_CPU as RlimitResource, soft, hard));
        }
        if let Some(bytes) = limits.memory_bytes() {
            entries.push((libc::RLIMIT_AS as RlimitResource, bytes, bytes));
        }
        if let Some(procs) = limits.max_processes {
            entries.push((libc::RLIMIT_NPROC as RlimitResource, procs, procs));
        }
        if let Some(mb) = limits.max_file_size_mb {
            let bytes = mb.saturating_mul(MIB);
            entries.push((libc::RLIMIT_FSIZE as RlimitResource, bytes, bytes));
        }
        RlimitSet { entries }
    }

    /// Runs in the forked child: no allocation, no locks.
    fn apply(&self) -> std::io::Result<()> {
        for &(resource, soft, hard) in &self.entries {
            let mut current = libc::rlimit {
                rlim_cur: 0,
                rlim_max: 0,
            };
            // SAFETY: `current` is a valid, writable rlimit struct.
            if unsafe { libc::getrlimit(resource, &mut current) } != 0 {
                return Err(std::io::Error::last_os_error());
            }

            // An unprivileged process cannot raise its hard limit.
            let mut hard = hard as libc::rlim_t;
            if current.rlim_max != libc::RLIM_INFINITY && current.rlim_max < hard {
                hard = current.rlim_max;
            }
            let soft = (soft as libc::rlim_t).min(hard);

            let limit = libc::rlimit {
                rlim_cur: soft,
                rlim_max: hard,
            };
            // SAFETY: `limit` is a valid rlimit struct.
            if unsafe { libc::setrlimit(resource, &limit) } != 0 {
                return Err(std::io::Error::last_os_error());
            }
        }
        Ok(())
    }
}
