//! Domain models and types.
//!
//! This module contains the core domain models, types, and business rules of the
//! exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ConceptCode`], [`SubjectKey`])
//! - **The ODM document model** ([`odm::OdmDocument`] and its definition tables)
//! - **Export rows** ([`ConceptRow`], [`ObservationFact`])
//! - **Error types** ([`OdmError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a subject key can never be passed
//! where a concept code is expected:
//!
//! ```rust
//! use odm_i2b2::domain::{ConceptCode, SubjectKey};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let subject = SubjectKey::new("SUBJ-001")?;
//! let code = ConceptCode::new("STUDY|S1|9e107d9d372bb6826bd81d3542a419d6")?;
//!
//! // let wrong: SubjectKey = code;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod concept;
pub mod errors;
pub mod ids;
pub mod observation;
pub mod odm;
pub mod result;

// Re-export commonly used types for convenience
pub use concept::{ConceptKind, ConceptRow, StudyScope, VisualAttribute};
pub use errors::{OdmError, ReferenceKind};
pub use ids::{ConceptCode, SubjectKey};
pub use observation::{FactValue, NumericValue, ObservationFact, ValueType};
pub use odm::OdmDocument;
pub use result::Result;
