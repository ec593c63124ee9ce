//! Export orchestration and reporting
//!
//! This module provides the top of the export pipeline:
//! - Per-study coordination of the walkers and the sink
//! - Summary and reporting

pub mod coordinator;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use summary::{ExportError, ExportErrorType, ExportSummary, StudySummary};
