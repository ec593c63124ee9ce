//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human readable console logs on stderr
//! - Configurable log levels, overridable with `RUST_LOG`
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use odm_i2b2::logging::init_logging;
//! use odm_i2b2::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(study_oid = "S_DEMO", "Study exported");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
