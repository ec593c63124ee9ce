//! Traversal of ODM studies
//!
//! - [`DefinitionWalker`] linearizes the definition tree of a study into
//!   concept rows
//! - [`ClinicalDataWalker`] turns the clinical data records of a study into
//!   observation facts
//!
//! Both resolve OID references through a [`StudyIndex`] and feed an
//! [`ExportSink`](crate::adapters::sink::ExportSink). A reference that does
//! not resolve is logged and its subtree skipped; it never fails the walk.

pub mod clinical;
pub mod definition;
pub mod index;

#[cfg(test)]
pub(crate) mod testing;

pub use clinical::ClinicalDataWalker;
pub use definition::DefinitionWalker;
pub use index::StudyIndex;

use crate::domain::StudyScope;
use serde::Serialize;

/// What a walker needs to know about the study being walked
#[derive(Debug, Clone, Copy)]
pub struct WalkContext<'a> {
    pub index: &'a StudyIndex<'a>,
    pub scope: &'a StudyScope,

    /// Preferred `TranslatedText` language
    pub language: &'a str,
}

/// Counters collected during a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub concepts: usize,
    pub facts: usize,
    pub subjects: usize,
    pub skipped_references: usize,
    pub dropped_facts: usize,
}

impl WalkStats {
    pub fn merge(&mut self, other: WalkStats) {
        self.concepts += other.concepts;
        self.facts += other.facts;
        self.subjects += other.subjects;
        self.skipped_references += other.skipped_references;
        self.dropped_facts += other.dropped_facts;
    }
}
