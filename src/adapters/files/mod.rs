//! tranSMART four-file export
//!
//! - [`tsv`] - tab-separated file with one-time header
//! - [`writer`] - the correlated writer keeping the four files consistent
//! - [`sink`] - [`ExportSink`](crate::adapters::sink::ExportSink) over the writer

pub mod sink;
pub mod tsv;
pub mod writer;

pub use sink::FileExportSink;
pub use tsv::{FileState, TsvFile};
pub use writer::{ColumnHandle, CorrelatedFileWriter, ExportFileNames};
