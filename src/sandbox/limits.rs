//! Resource ceilings applied to every sandboxed process

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// One mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Resource limits for one sandboxed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Wall-clock ceiling; the whole process group is killed when exceeded
    #[serde(with = "humantime_serde")]
    pub wall_time: Duration,
    /// CPU-time ceiling (`RLIMIT_CPU`)
    #[serde(with = "humantime_serde")]
    pub cpu_time: Option<Duration>,
    /// Address-space ceiling in MiB (`RLIMIT_AS`)
    pub memory_mb: Option<u64>,
    /// Process count ceiling (`RLIMIT_NPROC`)
    pub max_processes: Option<u64>,
    /// Largest file the child may create, in MiB (`RLIMIT_FSIZE`)
    pub max_file_size_mb: Option<u64>,
    /// Bytes kept per output stream; the rest is discarded
    pub max_output_bytes: usize,
}

fn default_wall_time() -> Duration {
    Duration::from_secs(30)
}

fn default_max_output() -> usize {
    1024 * 1024 // 1MB
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            wall_time: default_wall_time(),
            cpu_time: Some(default_wall_time()),
            memory_mb: Some(2048),
            max_processes: None,
            max_file_size_mb: None,
            max_output_bytes: default_max_output(),
        }
    }
}

impl ResourceLimits {
    /// Limits used for a single evaluation case
    pub fn per_case() -> Self {
        ResourceLimits {
            wall_time: Duration::from_secs(5),
            cpu_time: Some(Duration::from_secs(4)),
            memory_mb: Some(2048),
            ..Default::default()
        }
    }

    /// Set the wall-clock limit
    pub fn with_wall_time(mut self, wall_time: Duration) -> Self {
        self.wall_time = wall_time;
        self
    }

    /// Set the CPU-time limit
    pub fn with_cpu_time(mut self, cpu_time: Duration) -> Self {
        self.cpu_time = Some(cpu_time);
        self
    }

    /// Set the memory limit in MiB
    pub fn with_memory_mb(mut self, memory_mb: u64) -> Self {
        self.memory_mb = Some(memory_mb);
        self
    }

    /// Set the per-stream output cap
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    /// Address-space limit in bytes
    pub fn memory_bytes(&self) -> Option<u64> {
        self.memory_mb.map(|mb| mb.saturating_mul(MIB))
    }

    /// `(soft, hard)` seconds for `RLIMIT_CPU`, rounded up to whole seconds
    ///
    /// The soft limit delivers `SIGXCPU`, the hard limit one second later
    /// delivers `SIGKILL`.
    pub fn cpu_rlimit(&self) -> Option<(u64, u64)> {
        self.cpu_time.map(|cpu| {
            let mut secs = cpu.as_secs();
            if cpu.subsec_nanos() > 0 || secs == 0 {
                secs += 1;
            }
            (secs, secs + 1)
        })
    }

    /// Deserialize a possibly partial table on top of [`ResourceLimits::per_case`]
    ///
    /// Use with `deserialize_with` where the surrounding default is the
    /// per-case profile; the derived impl fills gaps from `Default`.
    pub fn deserialize_per_case<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        LimitOverrides::deserialize(deserializer).map(|o| o.apply(ResourceLimits::per_case()))
    }

    /// Whether this configuration can run anything at all
    pub fn validate(&self) -> Result<(), String> {
        if self.wall_time.is_zero() {
            return Err("wall_time must be greater than zero".to_string());
        }
        if matches!(self.cpu_time, Some(cpu) if cpu.is_zero()) {
            return Err("cpu_time must be greater than zero".to_string());
        }
        if self.memory_mb == Some(0) {
            return Err("memory_mb must be greater than zero".to_string());
        }
        if self.max_output_bytes == 0 {
            return Err("max_output_bytes must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// A limits table as written, before gaps are filled from a base profile
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LimitOverrides {
    #[serde(with = "humantime_serde")]
    wall_time: Option<Duration>,
    #[serde(with = "humantime_serde")]
    cpu_time: Option<Duration>,
    memory_mb: Option<u64>,
    max_processes: Option<u64>,
    max_file_size_mb: Option<u64>,
    max_output_bytes: Option<usize>,
}

impl LimitOverrides {
    fn apply(self, base: ResourceLimits) -> ResourceLimits {
        ResourceLimits {
            wall_time: self.wall_time.unwrap_or(base.wall_time),
            cpu_time: self.cpu_time.or(base.cpu_time),
            memory_mb: self.memory_mb.or(base.memory_mb),
            max_processes: self.max_processes.or(base.max_processes),
            max_file_size_mb: self.max_file_size_mb.or(base.max_file_size_mb),
            max_output_bytes: self.max_output_bytes.unwrap_or(base.max_output_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_rlimit_rounds_up() {
        let limits = ResourceLimits::default().with_cpu_time(Duration::from_millis(1500));
        assert_eq!(limits.cpu_rlimit(), Some((2, 3)));

        let limits = ResourceLimits::default().with_cpu_time(Duration::from_secs(4));
        assert_eq!(limits.cpu_rlimit(), Some((4, 5)));

        let limits = ResourceLimits::default().with_cpu_time(Duration::from_millis(10));
        assert_eq!(limits.cpu_rlimit(), Some((1, 2)));
    }

    #[test]
    fn test_memory_bytes() {
        let limits = ResourceLimits::default().with_memory_mb(256);
        assert_eq!(limits.memory_bytes(), Some(256 * MIB));
    }

    #[test]
    fn test_validate() {
        assert!(ResourceLimits::default().validate().is_ok());
        assert!(ResourceLimits::per_case().validate().is_ok());
        assert!(ResourceLimits::default()
            .with_wall_time(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ResourceLimits::default()
            .with_max_output_bytes(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_humantime() {
        let limits: ResourceLimits = serde_json::from_str(
            r#"{"wall_time": "2s", "cpu_time": "1s", "memory_mb": 128}"#,
        )
        .unwrap();
        assert_eq!(limits.wall_time, Duration::from_secs(2));
        assert_eq!(limits.cpu_time, Some(Duration::from_secs(1)));
        assert_eq!(limits.memory_mb, Some(128));
        assert_eq!(limits.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn test_deserialize_per_case_fills_gaps() {
        let mut deserializer = serde_json::Deserializer::from_str(r#"{"memory_mb": 256}"#);
        let limits = ResourceLimits::deserialize_per_case(&mut deserializer).unwrap();
        assert_eq!(limits, ResourceLimits::per_case().with_memory_mb(256));
    }
}
