//! Export sink abstraction
//!
//! This module defines the trait every export target implements. The walkers
//! drive a sink through this interface only and never know which variant
//! they are feeding.

use crate::domain::{ConceptRow, ObservationFact, Result, StudyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Destination of the concept rows and observation facts of an export
///
/// Calls arrive in a fixed order for each study:
///
/// 1. [`begin_study`](ExportSink::begin_study) once
/// 2. [`emit_concept`](ExportSink::emit_concept) for every concept in
///    pre-order
/// 3. [`emit_fact`](ExportSink::emit_fact) for every observation
/// 4. [`flush`](ExportSink::flush) once
///
/// Single-row failures are absorbed by the sink (logged and counted in
/// [`write_failures`](ExportSink::write_failures)). An `Err` from any method
/// means the export cannot continue.
#[async_trait]
pub trait ExportSink: Send {
    /// Short name used in logs and summaries
    fn name(&self) -> &'static str;

    /// Prepares the sink for a study, clearing any earlier export of it
    ///
    /// `started_at` is the engine-start time; every load timestamp the sink
    /// writes for the study uses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the outputs for the study cannot be opened.
    async fn begin_study(
        &mut self,
        scope: &StudyScope,
        started_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Accepts one concept row
    async fn emit_concept(&mut self, row: &ConceptRow) -> Result<()>;

    /// Accepts one observation fact
    async fn emit_fact(&mut self, fact: &ObservationFact) -> Result<()>;

    /// Drains buffered rows for the current study and releases its outputs
    ///
    /// Outputs are released even when draining fails; the first failure is
    /// returned afterwards.
    async fn flush(&mut self) -> Result<()>;

    /// Number of rows that could not be written since the sink was created
    fn write_failures(&self) -> usize;
}
