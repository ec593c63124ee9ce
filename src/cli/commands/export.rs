//! Export command implementation
//!
//! This module implements the `export` command for exporting an ODM
//! document to the four-file format or to i2b2 tables.

use super::{exit_code, load_or_default};
use crate::adapters::sink::create_export_sink;
use crate::config::ExportTarget;
use crate::core::export::{ExportCoordinator, ExportSummary};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// ODM XML document to export
    #[arg(value_name = "ODM_FILE")]
    pub odm_file: PathBuf,

    /// Override the output directory of the files target
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the export target (files or postgresql)
    #[arg(short, long)]
    pub target: Option<ExportTarget>,

    /// Dry run mode - walk the document without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write the export summary as JSON to this file
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(odm_file = %self.odm_file.display(), "Starting export command");

        let mut config = match load_or_default(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(exit_code::CONFIGURATION);
            }
        };

        // Apply CLI overrides
        if let Some(output_dir) = &self.output_dir {
            tracing::info!(output_dir = %output_dir.display(), "Overriding output directory from CLI");
            config.export.output_dir = output_dir.clone();
        }
        if let Some(target) = self.target {
            tracing::info!(target = ?target, "Overriding export target from CLI");
            config.export.target = target;
        }
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(exit_code::CONFIGURATION);
        }

        if config.application.dry_run {
            println!("DRY RUN MODE - No data will be written");
            println!();
        }

        let sink = match create_export_sink(&config).await {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export sink");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code::SINK_INIT);
            }
        };

        let mut coordinator = ExportCoordinator::new(config, sink);
        let summary = match coordinator.export_file(&self.odm_file).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code::FATAL);
            }
        };

        print_summary(&summary);

        if let Some(path) = &self.summary_json {
            if let Err(e) = summary.write_json(path).await {
                tracing::error!(error = %e, "Failed to write summary");
                eprintln!("Failed to write summary: {e}");
                return Ok(exit_code::FATAL);
            }
            println!("Summary written to {}", path.display());
        }

        Ok(exit_code::SUCCESS)
    }
}

fn print_summary(summary: &ExportSummary) {
    let totals = summary.totals();

    println!("Export Summary ({}):", summary.sink);
    for study in &summary.studies {
        println!(
            "  {} ({}): {} concepts, {} facts, {} subjects in {} ms",
            study.study_oid,
            study.study_name,
            study.stats.concepts,
            study.stats.facts,
            study.stats.subjects,
            study.elapsed_ms
        );
    }
    println!("  Skipped references: {}", totals.skipped_references);
    println!("  Dropped facts: {}", totals.dropped_facts);
    println!("  Write failures: {}", summary.write_failures);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());

    if !summary.errors.is_empty() {
        println!();
        println!("  Errors:");
        for error in &summary.errors {
            match &error.context {
                Some(context) => println!("    - {} ({context})", error.message),
                None => println!("    - {}", error.message),
            }
        }
    }
    println!();
}
