//! ODM document input
//!
//! Loads CDISC ODM XML files into [`crate::domain::OdmDocument`].

pub mod loader;

pub use loader::{load_document, parse_document};
