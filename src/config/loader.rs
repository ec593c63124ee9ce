//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::OdmI2b2Config;
use super::secret_string;
use crate::domain::errors::OdmError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment placeholder pattern")
});

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into OdmI2b2Config
/// 4. Applies environment variable overrides (ODM_I2B2_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use odm_i2b2::config::loader::load_config;
///
/// let config = load_config("odm-i2b2.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<OdmI2b2Config> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(OdmError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        OdmError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Builds a configuration from TOML text, applying substitution, overrides
/// and validation exactly like [`load_config`]
///
/// # Errors
///
/// Returns `OdmError::Configuration` if any step fails.
pub fn parse_config(contents: &str) -> Result<OdmI2b2Config> {
    let contents = substitute_env_vars(contents)?;

    let mut config: OdmI2b2Config = toml::from_str(&contents)
        .map_err(|e| OdmError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        OdmError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in ENV_PLACEHOLDER.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(OdmError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the ODM_I2B2_* prefix
///
/// Environment variables follow the pattern: ODM_I2B2_<SECTION>_<KEY>
/// For example: ODM_I2B2_EXPORT_TARGET, ODM_I2B2_POSTGRESQL_CONNECTION_STRING
fn apply_env_overrides(config: &mut OdmI2b2Config) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("ODM_I2B2_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("ODM_I2B2_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_bool("ODM_I2B2_APPLICATION_DRY_RUN", &val)?;
    }

    // Export overrides
    if let Ok(val) = std::env::var("ODM_I2B2_EXPORT_TARGET") {
        config.export.target = val.parse().map_err(OdmError::Configuration)?;
    }
    if let Ok(val) = std::env::var("ODM_I2B2_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("ODM_I2B2_EXPORT_SOURCE_SYSTEM") {
        config.export.source_system = Some(val);
    }
    if let Ok(val) = std::env::var("ODM_I2B2_EXPORT_LANGUAGE") {
        config.export.language = val;
    }
    if let Ok(val) = std::env::var("ODM_I2B2_EXPORT_BATCH_SIZE") {
        config.export.batch_size = val.parse().map_err(|_| {
            OdmError::Configuration(format!(
                "ODM_I2B2_EXPORT_BATCH_SIZE must be a positive integer, got '{val}'"
            ))
        })?;
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("ODM_I2B2_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("ODM_I2B2_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg_config.max_connections = max;
            }
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("ODM_I2B2_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_bool("ODM_I2B2_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("ODM_I2B2_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(OdmError::Configuration(format!(
            "{name} must be true or false, got '{value}'"
        ))),
    }
}
