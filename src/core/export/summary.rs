//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::core::walker::WalkStats;
use crate::domain::{OdmError, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Result of exporting one study
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudySummary {
    pub study_oid: String,
    pub study_name: String,

    #[serde(flatten)]
    pub stats: WalkStats,

    pub elapsed_ms: u64,
}

/// Summary of an export operation
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Name of the sink that received the export
    pub sink: String,

    /// Per-study results in document order
    pub studies: Vec<StudySummary>,

    /// Rows the sink failed to write
    pub write_failures: usize,

    /// Duration of the export
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new(sink: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            studies: Vec::new(),
            write_failures: 0,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    pub fn add_study(&mut self, study: StudySummary) {
        self.studies.push(study);
    }

    /// Counters summed over all studies
    pub fn totals(&self) -> WalkStats {
        let mut totals = WalkStats::default();
        for study in &self.studies {
            totals.merge(study.stats);
        }
        totals
    }

    /// Check if the export was successful (no failures)
    ///
    /// Skipped references and dropped facts are reported but do not count
    /// as failures.
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && self.write_failures == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        let totals = self.totals();
        tracing::info!(
            sink = %self.sink,
            studies = self.studies.len(),
            concepts = totals.concepts,
            facts = totals.facts,
            subjects = totals.subjects,
            skipped_references = totals.skipped_references,
            dropped_facts = totals.dropped_facts,
            write_failures = self.write_failures,
            duration_ms = self.duration.as_millis() as u64,
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = ?error.context,
                    "Export error"
                );
            }
        }
    }

    /// Pretty-printed JSON form of the summary
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON form of the summary to `path`
    ///
    /// # Errors
    ///
    /// Returns `OdmError::Io` if the file cannot be written.
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        tokio::fs::write(path, json).await.map_err(|e| {
            OdmError::Io(format!(
                "Failed to write summary to '{}': {e}",
                path.display()
            ))
        })
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorType {
    /// A study could not be indexed
    Definition,
    /// A ClinicalData block names no known study
    ClinicalData,
}

/// Export error with context
#[derive(Debug, Clone, Serialize)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., study OID)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}
