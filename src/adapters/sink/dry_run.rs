//! Sink that counts rows without writing them

use crate::adapters::sink::ExportSink;
use crate::domain::{ConceptRow, ObservationFact, OdmError, Result, StudyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Accepts the full export stream and only counts it
///
/// Used for `--dry-run` so a document can be checked end to end without
/// touching the output directory or the database.
#[derive(Debug, Default)]
pub struct DryRunSink {
    study_oid: Option<String>,
    concepts: usize,
    facts: usize,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concepts received for the current study
    pub fn concepts(&self) -> usize {
        self.concepts
    }

    /// Facts received for the current study
    pub fn facts(&self) -> usize {
        self.facts
    }
}

#[async_trait]
impl ExportSink for DryRunSink {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn begin_study(
        &mut self,
        scope: &StudyScope,
        _started_at: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(active) = &self.study_oid {
            return Err(OdmError::Protocol(format!(
                "study '{}' started before '{active}' was flushed",
                scope.study_oid
            )));
        }
        self.study_oid = Some(scope.study_oid.clone());
        self.concepts = 0;
        self.facts = 0;
        Ok(())
    }

    async fn emit_concept(&mut self, _row: &ConceptRow) -> Result<()> {
        self.concepts += 1;
        Ok(())
    }

    async fn emit_fact(&mut self, _fact: &ObservationFact) -> Result<()> {
        self.facts += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        let study_oid = self
            .study_oid
            .take()
            .ok_or_else(|| OdmError::Protocol("flush without a started study".to_string()))?;

        tracing::info!(
            study_oid = %study_oid,
            concepts = self.concepts,
            facts = self.facts,
            "DRY RUN: Would write {} concepts and {} facts",
            self.concepts,
            self.facts
        );
        Ok(())
    }

    fn write_failures(&self) -> usize {
        0
    }
}
