//! Configuration paths
//!
//! Utilities for resolving configuration file and session directory paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("SESSIONBOX_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("sessionbox"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("sessionbox"))
                .unwrap_or_else(|| PathBuf::from(".sessionbox"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("SESSIONBOX_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}

/// Default directory that holds one subdirectory per session
pub fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join("genie_repl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        assert!(config_path().file_name().is_some());
        assert!(default_base_dir().is_absolute());
    }
}
