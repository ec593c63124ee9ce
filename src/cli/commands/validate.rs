//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the ODM-i2b2 configuration file.

use super::exit_code;
use crate::adapters::postgresql::client::connection_string_safe;
use crate::config::{load_config, ExportTarget, OdmI2b2Config};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// [`load_config`] already validates, so a file that loads is valid.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration is valid");
                println!();
                print_config_summary(&config);
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                println!("Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(exit_code::CONFIGURATION)
            }
        }
    }
}

fn print_config_summary(config: &OdmI2b2Config) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);
    println!("  Language: {}", config.export.language);
    if let Some(source_system) = &config.export.source_system {
        println!("  Source System Override: {source_system}");
    }

    match config.export.target {
        ExportTarget::Files => {
            println!("  Export Target: files");
            println!("  Output Directory: {}", config.export.output_dir.display());
        }
        ExportTarget::PostgreSQL => {
            println!("  Export Target: PostgreSQL");
            if let Some(ref pg_config) = config.postgresql {
                println!(
                    "  PostgreSQL Connection: {}",
                    connection_string_safe(pg_config.connection_string.expose_secret().as_ref())
                );
                println!("  Metadata Table: {}", pg_config.metadata_table);
                println!("  Fact Table: {}", pg_config.fact_table);
                println!("  Max Connections: {}", pg_config.max_connections);
            }
            println!("  Batch Size: {}", config.export.batch_size);
        }
    }

    if config.logging.local_enabled {
        println!(
            "  Log File: {} ({})",
            config.logging.local_path, config.logging.local_rotation
        );
    }
    println!();
}
