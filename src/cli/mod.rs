// ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL Tool
// Copyright (c) 2025 ODM-i2b2 Contributors
// Licensed under the MIT License

//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for ODM-i2b2 using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Default configuration file, used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "odm-i2b2.toml";

/// ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL Tool
#[derive(Parser, Debug)]
#[command(name = "odm-i2b2")]
#[command(version, about, long_about = None)]
#[command(author = "ODM-i2b2 Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "ODM_I2B2_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ODM_I2B2_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export an ODM document to the configured target
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportTarget;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["odm-i2b2", "export", "study.xml"]);
        assert_eq!(cli.config, DEFAULT_CONFIG_PATH);
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.odm_file, PathBuf::from("study.xml"));
                assert!(!args.dry_run);
                assert!(args.target.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "odm-i2b2",
            "export",
            "study.xml",
            "--output-dir",
            "out",
            "--target",
            "postgresql",
            "--dry-run",
            "--summary-json",
            "summary.json",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.target, Some(ExportTarget::PostgreSQL));
        assert!(args.dry_run);
        assert_eq!(args.summary_json, Some(PathBuf::from("summary.json")));
    }

    #[test]
    fn test_cli_export_requires_file() {
        assert!(Cli::try_parse_from(["odm-i2b2", "export"]).is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["odm-i2b2", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["odm-i2b2", "--log-level", "debug", "init"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
