//! printlcd daemon library
//!
//! Shows print job status on an LCDproc display. The `printlcdd` binary
//! wires these modules together; the `printlcd` CLI reuses the control
//! socket types.

pub mod driver;
pub mod ipc;
pub mod lcdproc;

use std::path::Path;

use anyhow::{Context, Result};
use printlcd_config::Config;

/// Load the configuration file, falling back to defaults if it does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "Config file not found, using defaults"
        );
        return Ok(Config::default());
    }

    printlcd_config::parse_config(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use printlcd_config::Priority;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = load_config(&temp_dir.path().join("absent.kdl")).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.kdl");
        std::fs::write(&path, "lcdproc {\n    priority-printing \"info\"\n}\n").unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.display.priority_printing, Priority::Info);
    }

    #[test]
    fn test_broken_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.kdl");
        std::fs::write(&path, "lcdproc {").unwrap();

        let err = load_config(&path).unwrap_err();

        assert!(err.to_string().contains("config.kdl"));
    }
}
