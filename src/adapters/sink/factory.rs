//! Export sink factory
//!
//! Creates the sink selected by `export.target`, or a [`DryRunSink`] when
//! dry-run mode is on.

use crate::adapters::files::FileExportSink;
use crate::adapters::postgresql::{PostgreSQLClient, PostgreSQLSink};
use crate::adapters::sink::{DryRunSink, ExportSink};
use crate::config::{ExportTarget, OdmI2b2Config};
use crate::domain::{OdmError, Result};

/// Create an export sink based on the configuration
///
/// For the PostgreSQL target this connects to the database, checks the
/// connection and creates the i2b2 tables if they are missing.
///
/// # Errors
///
/// Returns an error if the selected target cannot be initialized.
pub async fn create_export_sink(config: &OdmI2b2Config) -> Result<Box<dyn ExportSink>> {
    if config.application.dry_run {
        tracing::info!("Dry run enabled; nothing will be written");
        return Ok(Box::new(DryRunSink::new()));
    }

    match config.export.target {
        ExportTarget::Files => {
            tracing::info!(
                output_dir = %config.export.output_dir.display(),
                "Creating file export sink"
            );
            Ok(Box::new(FileExportSink::new(config.export.output_dir.clone())))
        }
        ExportTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                OdmError::Configuration(
                    "postgresql configuration is required when export.target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL export sink");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            client.test_connection().await?;
            client.ensure_schema_exists().await?;

            Ok(Box::new(PostgreSQLSink::new(
                client,
                config.export.batch_size,
            )))
        }
    }
}
