//! PostgreSQL export target
//!
//! Writes concept rows to an i2b2 metadata table and observation facts to
//! an i2b2 `observation_fact` table.

pub mod client;
pub mod models;
pub mod sink;

pub use client::PostgreSQLClient;
pub use models::{MetadataRow, ObservationRow};
pub use sink::PostgreSQLSink;
