//! Shared fixtures for walker and coordinator tests

use crate::adapters::odm::parse_document;
use crate::adapters::sink::ExportSink;
use crate::domain::{ConceptRow, ObservationFact, OdmDocument, Result, StudyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub const DEMO_XML: &str = include_str!("../../../tests/fixtures/demo_study.xml");

pub fn demo_document() -> OdmDocument {
    parse_document(DEMO_XML).unwrap()
}

/// Sink that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub scopes: Vec<StudyScope>,
    pub concepts: Vec<ConceptRow>,
    pub facts: Vec<ObservationFact>,
    pub flushes: usize,
}

#[async_trait]
impl ExportSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn begin_study(
        &mut self,
        scope: &StudyScope,
        _started_at: DateTime<Utc>,
    ) -> Result<()> {
        self.scopes.push(scope.clone());
        Ok(())
    }

    async fn emit_concept(&mut self, row: &ConceptRow) -> Result<()> {
        self.concepts.push(row.clone());
        Ok(())
    }

    async fn emit_fact(&mut self, fact: &ObservationFact) -> Result<()> {
        self.facts.push(fact.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn write_failures(&self) -> usize {
        0
    }
}
