//! Export sink abstraction layer
//!
//! The walkers feed every export target through the [`ExportSink`] trait.
//! [`create_export_sink`] picks the implementation named in the
//! configuration.

pub mod dry_run;
pub mod factory;
pub mod traits;

pub use dry_run::DryRunSink;
pub use factory::create_export_sink;
pub use traits::ExportSink;
