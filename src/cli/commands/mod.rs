//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod init;
pub mod validate;

use crate::cli::DEFAULT_CONFIG_PATH;
use crate::config::{load_config, parse_config, OdmI2b2Config};
use crate::domain::Result;
use std::path::Path;

/// Process exit codes
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const CONFIGURATION: i32 = 2;
    pub const SINK_INIT: i32 = 4;
    pub const FATAL: i32 = 5;
}

/// Loads the configuration file, falling back to defaults when the default
/// file does not exist
///
/// An explicitly named file that is missing is still an error.
pub fn load_or_default(config_path: &str) -> Result<OdmI2b2Config> {
    if config_path == DEFAULT_CONFIG_PATH && !Path::new(config_path).exists() {
        tracing::debug!(config_path, "No configuration file; using defaults");
        return parse_config("");
    }
    load_config(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_config_is_error() {
        assert!(load_or_default("/nonexistent/odm.toml").is_err());
    }
}
