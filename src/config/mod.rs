//! Configuration management for ODM-i2b2.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! ODM-i2b2 uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ODM_I2B2_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use odm_i2b2::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("odm-i2b2.toml")?;
//! println!("Target: {:?}", config.export.target);
//! println!("Output: {}", config.export.output_dir.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and dry-run mode
//! - [`ExportConfig`] - Target, output directory, language, batch size
//! - [`PostgreSQLConfig`] - Database connection and table names
//! - [`LoggingConfig`] - Local JSON log file
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! target = "postgresql"
//! batch_size = 1000
//!
//! [postgresql]
//! connection_string = "${ODM_I2B2_PG_URL}"
//! metadata_table = "i2b2metadata.i2b2"
//! fact_table = "i2b2demodata.observation_fact"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ExportConfig, ExportTarget, LoggingConfig, OdmI2b2Config, PostgreSQLConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
