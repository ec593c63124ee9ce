//! Core business logic for ODM-i2b2.
//!
//! # Modules
//!
//! - [`concept_code`] - Deterministic concept codes
//! - [`metadata_xml`] - Value metadata attached to item concepts
//! - [`walker`] - Definition and clinical data traversal
//! - [`export`] - Per-study export coordination and summary
//!
//! # Export Workflow
//!
//! For every study in the document:
//!
//! 1. **Index**: Build OID lookup tables for the study definitions
//! 2. **Begin**: Let the sink clear or open the study's outputs
//! 3. **Definitions**: Emit the concept hierarchy in pre-order
//! 4. **Clinical data**: Emit one fact per recorded value
//! 5. **Flush**: Drain the sink and record the study summary

pub mod concept_code;
pub mod export;
pub mod metadata_xml;
pub mod walker;
