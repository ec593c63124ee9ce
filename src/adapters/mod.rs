//! External system integrations for ODM-i2b2.
//!
//! This module provides adapters for the systems an export reads from and
//! writes to:
//!
//! - [`odm`] - ODM XML document loading
//! - [`sink`] - export sink abstraction layer (trait-based)
//! - [`files`] - tranSMART four-file implementation
//! - [`postgresql`] - i2b2 PostgreSQL implementation
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with recording implementations. The walkers only see the
//! [`sink::ExportSink`] trait and never know which target they are feeding.
//!
//! # File Sink
//!
//! ```rust,no_run
//! use odm_i2b2::adapters::files::FileExportSink;
//! use odm_i2b2::adapters::sink::ExportSink;
//! use odm_i2b2::domain::StudyScope;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut sink = FileExportSink::new("./export");
//! sink.begin_study(&StudyScope::new("S_DEMO", "Demo Study", "EDC"), chrono::Utc::now())
//!     .await?;
//! // Walkers emit concepts and facts here
//! sink.flush().await?;
//! # Ok(())
//! # }
//! ```

pub mod files;
pub mod odm;
pub mod postgresql;
pub mod sink;
