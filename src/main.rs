// ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL Tool
// Copyright (c) 2025 ODM-i2b2 Contributors
// Licensed under the MIT License

use clap::Parser;
use odm_i2b2::cli::commands::{exit_code, load_or_default};
use odm_i2b2::cli::{Cli, Commands};
use odm_i2b2::config::LoggingConfig;
use odm_i2b2::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging comes up before the command runs; a broken configuration is
    // reported by the command itself, so fall back to console defaults here
    let config = load_or_default(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = config.map(|c| c.logging).unwrap_or_else(LoggingConfig::default);

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(exit_code::CONFIGURATION);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL Tool"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            exit_code::FATAL
        }
    };

    // process::exit skips destructors; flush the log file first
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Export(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
