// ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL Tool
// Copyright (c) 2025 ODM-i2b2 Contributors
// Licensed under the MIT License

//! # ODM-i2b2 - CDISC ODM to i2b2/tranSMART ETL
//!
//! ODM-i2b2 reads a CDISC ODM 1.3 clinical trial document and loads it into
//! an i2b2 or tranSMART research warehouse.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** study definitions and clinical data from ODM XML
//! - **Transforming** the definition tree into a five-level concept
//!   hierarchy and the clinical data into observation facts
//! - **Loading** the result as tranSMART four-file exports or as rows in the
//!   i2b2 metadata and `observation_fact` tables
//!
//! ## Architecture
//!
//! ODM-i2b2 follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (concept codes, tree walks, export coordination)
//! - [`adapters`] - External integrations (ODM XML, four files, PostgreSQL)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use odm_i2b2::adapters::sink::create_export_sink;
//! use odm_i2b2::config::load_config;
//! use odm_i2b2::core::export::ExportCoordinator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("odm-i2b2.toml")?;
//!     let sink = create_export_sink(&config).await?;
//!
//!     let mut coordinator = ExportCoordinator::new(config, sink);
//!     let summary = coordinator.export_file(Path::new("study.xml")).await?;
//!
//!     println!("Exported {} facts", summary.totals().facts);
//!     Ok(())
//! }
//! ```
//!
//! ## Concept Codes
//!
//! Every item and code list item gets a concept code derived from its
//! position in the study, so re-exporting a document yields the same codes:
//!
//! ```rust
//! use odm_i2b2::core::concept_code::{generate_concept_code, ItemPath};
//!
//! let path = ItemPath {
//!     source_system: "EDC",
//!     study_oid: "S_DEMO",
//!     study_event_oid: "SE_BASE",
//!     form_oid: "F_DEMOG",
//!     item_oid: "I_SEX",
//! };
//! let item = generate_concept_code(&path, None);
//! let male = generate_concept_code(&path, Some("M"));
//!
//! assert_ne!(item, male);
//! assert_eq!(item, generate_concept_code(&path, None));
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with
//! [`domain::OdmError`]. Unresolved references and unusable values are
//! logged and counted instead of failing the export.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
