//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::exit_code;
use crate::cli::DEFAULT_CONFIG_PATH;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

/// Sample configuration written by `init`
pub const SAMPLE_CONFIG: &str = r#"# ODM-i2b2 Configuration File
# CDISC ODM to i2b2/tranSMART ETL Tool

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Walk the document and count rows without writing anything
dry_run = false

[export]
# Export target: "files" (tranSMART four-file format) or "postgresql" (i2b2 tables)
target = "files"

# Directory receiving {study}_concept_map.txt, {study}_columns.txt,
# {study}_word_map.txt and {study}_clinical_data.txt
output_dir = "./export"

# Overrides the SourceSystem attribute of the ODM document
# source_system = "EDC"

# Preferred language of TranslatedText descriptions and decodes
language = "en"

# Rows per database batch (1-10000)
batch_size = 1000

# Required when target = "postgresql"
# [postgresql]
# connection_string = "${ODM_I2B2_PG_URL}"
# max_connections = 4
# connection_timeout_seconds = 30
# statement_timeout_seconds = 60
# metadata_table = "i2b2metadata.i2b2"
# fact_table = "i2b2demodata.observation_fact"

[logging]
# JSON log file in addition to the console
local_enabled = false
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#;

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(exit_code::CONFIGURATION);
        }

        match fs::write(&self.output, SAMPLE_CONFIG) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. For PostgreSQL: set ODM_I2B2_PG_URL (a .env file works)");
                println!("  3. Validate configuration: odm-i2b2 validate-config");
                println!("  4. Run export: odm-i2b2 export study.xml");
                println!();
                Ok(exit_code::SUCCESS)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(exit_code::FATAL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, ExportTarget};
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_is_valid() {
        let config = parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.export.target, ExportTarget::Files);
        assert!(config.postgresql.is_none());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("odm-i2b2.toml");
        fs::write(&output, "keep me").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), exit_code::CONFIGURATION);
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), exit_code::SUCCESS);
        assert_eq!(fs::read_to_string(&output).unwrap(), SAMPLE_CONFIG);
    }
}
