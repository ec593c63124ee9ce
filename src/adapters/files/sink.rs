//! Four-file export sink
//!
//! Adapts the concept and fact stream of the walkers to the call protocol
//! of [`CorrelatedFileWriter`]: every item concept becomes a clinical data
//! column, every code list item a categorical value of the column before
//! it, and every fact a cell.

use super::writer::{ColumnHandle, CorrelatedFileWriter};
use crate::adapters::sink::ExportSink;
use crate::domain::{ConceptKind, ConceptRow, ObservationFact, OdmError, Result, StudyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug)]
pub struct FileExportSink {
    output_dir: PathBuf,
    writer: Option<CorrelatedFileWriter>,
    current_column: Option<ColumnHandle>,
    finished_write_failures: usize,
}

impl FileExportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            writer: None,
            current_column: None,
            finished_write_failures: 0,
        }
    }

    fn writer(&mut self) -> Result<&mut CorrelatedFileWriter> {
        self.writer
            .as_mut()
            .ok_or_else(|| OdmError::Protocol("no study has been started".to_string()))
    }
}

#[async_trait]
impl ExportSink for FileExportSink {
    fn name(&self) -> &'static str {
        "files"
    }

    async fn begin_study(
        &mut self,
        scope: &StudyScope,
        _started_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.writer.is_some() {
            return Err(OdmError::Protocol(format!(
                "study '{}' started before the previous study was flushed",
                scope.study_oid
            )));
        }

        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            OdmError::Io(format!(
                "Failed to create output directory '{}': {e}",
                self.output_dir.display()
            ))
        })?;

        let writer = CorrelatedFileWriter::create(&self.output_dir, &scope.file_prefix())?;
        tracing::info!(
            study_oid = %scope.study_oid,
            output_dir = %self.output_dir.display(),
            clinical_data = %writer.file_names().clinical_data,
            "Writing study export files"
        );

        self.writer = Some(writer);
        self.current_column = None;
        Ok(())
    }

    async fn emit_concept(&mut self, row: &ConceptRow) -> Result<()> {
        match row.kind {
            ConceptKind::Item => {
                let code = row.concept_code.clone().ok_or_else(|| {
                    OdmError::Protocol(format!("item concept '{}' has no code", row.full_path))
                })?;
                let writer = self.writer()?;
                writer.emit_concept_row(&row.category_path, &row.name)?;
                let handle = writer.register_column(&row.category_path, &row.name, code)?;
                self.current_column = Some(handle);
            }
            ConceptKind::CodeListItem => {
                let coded_value = row.coded_value.as_deref().ok_or_else(|| {
                    OdmError::Protocol(format!(
                        "code list concept '{}' has no coded value",
                        row.full_path
                    ))
                })?;
                let handle = self.current_column.clone().ok_or_else(|| {
                    OdmError::Protocol(format!(
                        "code list concept '{}' arrived before its item",
                        row.full_path
                    ))
                })?;
                self.writer()?
                    .register_categorical_value(&handle, coded_value)?;
            }
            // Study, event and form rows only shape the paths
            ConceptKind::Study | ConceptKind::Event | ConceptKind::Form => {}
        }
        Ok(())
    }

    async fn emit_fact(&mut self, fact: &ObservationFact) -> Result<()> {
        self.writer()?
            .emit_fact(&fact.column_code, &fact.raw_value, &fact.subject_key)
    }

    async fn flush(&mut self) -> Result<()> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| OdmError::Protocol("flush without a started study".to_string()))?;
        self.current_column = None;

        let result = writer.flush();
        self.finished_write_failures += writer.write_failures();
        result
    }

    fn write_failures(&self) -> usize {
        self.finished_write_failures
            + self
                .writer
                .as_ref()
                .map(CorrelatedFileWriter::write_failures)
                .unwrap_or(0)
    }
}
