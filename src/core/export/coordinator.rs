//! Export coordinator - main orchestrator for the export process
//!
//! This module runs one export: it loads the document, then for every study
//! walks the definitions and the matching clinical data into the sink and
//! records the outcome in an [`ExportSummary`].

use crate::adapters::odm::load_document;
use crate::adapters::sink::ExportSink;
use crate::config::OdmI2b2Config;
use crate::core::export::summary::{ExportError, ExportErrorType, ExportSummary, StudySummary};
use crate::core::metadata_xml::MetadataXmlBuilder;
use crate::core::walker::{ClinicalDataWalker, DefinitionWalker, StudyIndex, WalkContext};
use crate::domain::odm::{OdmDocument, Study};
use crate::domain::{OdmError, Result, StudyScope};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Instant;

/// Export coordinator
pub struct ExportCoordinator {
    config: OdmI2b2Config,
    sink: Box<dyn ExportSink>,

    /// Engine-start time stamped on metadata and facts
    started_at: DateTime<Utc>,
}

impl ExportCoordinator {
    /// Create a new export coordinator feeding `sink`
    pub fn new(config: OdmI2b2Config, sink: Box<dyn ExportSink>) -> Self {
        Self {
            config,
            sink,
            started_at: Utc::now(),
        }
    }

    /// Replace the engine-start time, making the output reproducible
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Load the ODM file at `path` and export it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if it contains
    /// no study, or if the sink fails.
    pub async fn export_file(&mut self, path: &Path) -> Result<ExportSummary> {
        let document = load_document(path).await?;
        self.export_document(&document).await
    }

    /// Export every study of a loaded document
    ///
    /// Studies are exported one after another in document order; each study
    /// is flushed before the next one begins.
    ///
    /// # Errors
    ///
    /// Returns `OdmError::MissingStudy` if the document has no study, or the
    /// first sink error. Unresolved references and bad values are reported
    /// in the summary instead.
    pub async fn export_document(&mut self, document: &OdmDocument) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new(self.sink.name());

        if document.studies.is_empty() {
            return Err(OdmError::MissingStudy(String::new()));
        }

        tracing::info!(
            studies = document.studies.len(),
            clinical_data = document.clinical_data.len(),
            sink = self.sink.name(),
            "Starting export process"
        );

        for clinical_data in &document.clinical_data {
            if document.study(&clinical_data.study_oid).is_none() {
                tracing::error!(
                    study_oid = %clinical_data.study_oid,
                    "Clinical data refers to an unknown study; skipping"
                );
                summary.add_error(
                    ExportError::new(
                        ExportErrorType::ClinicalData,
                        "clinical data refers to an unknown study".to_string(),
                    )
                    .with_context(format!("study_oid={}", clinical_data.study_oid)),
                );
            }
        }

        for study in &document.studies {
            self.export_study(document, study, &mut summary).await?;
        }

        summary.write_failures = self.sink.write_failures();
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    async fn export_study(
        &mut self,
        document: &OdmDocument,
        study: &Study,
        summary: &mut ExportSummary,
    ) -> Result<()> {
        let study_start = Instant::now();

        let index = match StudyIndex::build(study) {
            Ok(index) => index,
            Err(e) if e.is_recoverable() => {
                tracing::error!(study_oid = %study.oid, error = %e, "Skipping study");
                summary.add_error(
                    ExportError::new(ExportErrorType::Definition, e.to_string())
                        .with_context(format!("study_oid={}", study.oid)),
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let scope = StudyScope::new(&study.oid, study.name(), self.source_system(document));
        let ctx = WalkContext {
            index: &index,
            scope: &scope,
            language: &self.config.export.language,
        };
        let metadata = MetadataXmlBuilder::new(self.started_at);

        self.sink.begin_study(&scope, self.started_at).await?;

        let mut stats = DefinitionWalker::new(ctx, &metadata)
            .walk(self.sink.as_mut())
            .await?;

        let clinical_walker = ClinicalDataWalker::new(ctx, self.started_at);
        for clinical_data in document
            .clinical_data
            .iter()
            .filter(|cd| cd.study_oid == study.oid)
        {
            stats.merge(clinical_walker.walk(clinical_data, self.sink.as_mut()).await?);
        }

        self.sink.flush().await?;

        let elapsed_ms = study_start.elapsed().as_millis() as u64;
        tracing::info!(
            study_oid = %scope.study_oid,
            concepts = stats.concepts,
            facts = stats.facts,
            subjects = stats.subjects,
            skipped_references = stats.skipped_references,
            dropped_facts = stats.dropped_facts,
            elapsed_ms,
            "Study exported"
        );

        summary.add_study(StudySummary {
            study_oid: scope.study_oid,
            study_name: scope.study_name,
            stats,
            elapsed_ms,
        });
        Ok(())
    }

    /// Configured override, else the document's SourceSystem attribute
    fn source_system(&self, document: &OdmDocument) -> String {
        self.config
            .export
            .source_system
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(document.source_system.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}
