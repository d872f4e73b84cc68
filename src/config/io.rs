//! Configuration I/O - Loading configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;
use tracing::warn;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (explicit path, else the default config path) if it exists,
///    otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => load_config_from_path(path)?,
        None => {
            let config_path = super::paths::config_path();
            if config_path.exists() {
                load_config_from_path(&config_path)?
            } else {
                Config::default()
            }
        }
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_config(&content, path)
}

/// Parse configuration text, picking the format from the file extension
pub fn parse_config(content: &str, path: &Path) -> Result<Config> {
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(content)
            .or_else(|_| toml::from_str(content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads a `.env` file if present, then overlays any set variables. Env vars
/// have the highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Overlay values produced by `lookup` onto `config`
pub(crate) fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("SESSIONBOX_BASE_DIR") {
        config.sandbox.base_dir = dir.into();
    }
    if let Some(python) = lookup("SESSIONBOX_PYTHON") {
        config.sandbox.python = python;
    }
    if let Some(bind) = lookup("SESSIONBOX_BIND") {
        config.server.bind = bind;
    }
    if let Some(port) = lookup("SESSIONBOX_PORT") {
        match port.parse() {
            Ok(v) => config.server.port = v,
            Err(_) => warn!("Ignoring invalid SESSIONBOX_PORT '{}'", port),
        }
    }
    if let Some(workers) = lookup("REPL_MAX_WORKERS") {
        match workers.parse() {
            Ok(v) => config.evaluator.max_workers = v,
            Err(_) => warn!("Ignoring invalid REPL_MAX_WORKERS '{}'", workers),
        }
    }
    if let Some(timeout) = lookup("SESSIONBOX_RUN_TIMEOUT") {
        match timeout.parse() {
            Ok(secs) => config.run.wall_time = std::time::Duration::from_secs(secs),
            Err(_) => warn!("Ignoring invalid SESSIONBOX_RUN_TIMEOUT '{}'", timeout),
        }
    }
    if let Some(level) = lookup("RUST_LOG") {
        config.log.level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        match format.parse() {
            Ok(v) => config.log.format = v,
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_parse_json5_config() {
        let config = parse_config(
            r#"{
                // comments are fine in JSON5
                server: { port: 7100 },
                sandbox: { base_dir: "/srv/sessions" },
            }"#,
            Path::new("config.json"),
        )
        .unwrap();
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.sandbox.base_dir, PathBuf::from("/srv/sessions"));
    }

    #[test]
    fn test_parse_toml_config() {
        let config = parse_config(
            r#"
            [evaluator]
            max_workers = 3

            [run]
            wall_time = "45s"
            "#,
            Path::new("sessionbox.toml"),
        )
        .unwrap();
        assert_eq!(config.evaluator.max_workers, 3);
        assert_eq!(config.run.wall_time, Duration::from_secs(45));
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(parse_config("{ not valid", Path::new("config.json")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SESSIONBOX_BASE_DIR", "/var/lib/sessionbox"),
            ("SESSIONBOX_PORT", "8123"),
            ("REPL_MAX_WORKERS", "2"),
            ("SESSIONBOX_RUN_TIMEOUT", "90"),
            ("LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_overrides_from(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.sandbox.base_dir, PathBuf::from("/var/lib/sessionbox"));
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.evaluator.max_workers, 2);
        assert_eq!(config.run.wall_time, Duration::from_secs(90));
        assert_eq!(config.log.format, crate::config::LogFormat::Json);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        apply_overrides_from(&mut config, |k| match k {
            "SESSIONBOX_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 6000);
    }
}
