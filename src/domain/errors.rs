//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Recoverable
//! failures (unresolvable references, unsupported values, single-write I/O
//! failures) are absorbed by the component that detects them; only the
//! variants that reach the caller abort a run.

use thiserror::Error;

/// Main error type
///
/// This is the primary error type used throughout the application.
/// It never exposes third-party error types directly.
#[derive(Debug, Error)]
pub enum OdmError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The ODM document could not be read or deserialized
    #[error("Parse error: {0}")]
    Parse(String),

    /// The document contains no study definitions at all
    #[error("No study definitions were found in ODM document{0}")]
    MissingStudy(String),

    /// An OID reference could not be resolved against the study tables
    #[error("Unresolved reference: {kind} '{oid}' not found in study '{study_oid}'")]
    Reference {
        kind: ReferenceKind,
        oid: String,
        study_oid: String,
    },

    /// A value does not fit the data type declared by its definition
    #[error("Unsupported value '{value}' for item '{item_oid}': {reason}")]
    Value {
        item_oid: String,
        value: String,
        reason: String,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// The correlated writer was driven out of order
    #[error("Writer protocol violation: {0}")]
    Protocol(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl OdmError {
    /// Returns true for the error classes that are logged and skipped
    /// instead of aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OdmError::Reference { .. } | OdmError::Value { .. } | OdmError::Io(_)
        )
    }
}

/// The kind of definition an unresolved OID was expected to name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    MetaDataVersion,
    StudyEvent,
    Form,
    ItemGroup,
    Item,
    CodeList,
    CodeListItem,
    Study,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::MetaDataVersion => "MetaDataVersion",
            ReferenceKind::StudyEvent => "StudyEventDef",
            ReferenceKind::Form => "FormDef",
            ReferenceKind::ItemGroup => "ItemGroupDef",
            ReferenceKind::Item => "ItemDef",
            ReferenceKind::CodeList => "CodeList",
            ReferenceKind::CodeListItem => "CodeListItem",
            ReferenceKind::Study => "Study",
        };
        f.write_str(name)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for OdmError {
    fn from(err: std::io::Error) -> Self {
        OdmError::Io(err.to_string())
    }
}

impl From<csv::Error> for OdmError {
    fn from(err: csv::Error) -> Self {
        OdmError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for OdmError {
    fn from(err: serde_json::Error) -> Self {
        OdmError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for OdmError {
    fn from(err: toml::de::Error) -> Self {
        OdmError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<quick_xml::DeError> for OdmError {
    fn from(err: quick_xml::DeError) -> Self {
        OdmError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OdmError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_reference_error_display() {
        let err = OdmError::Reference {
            kind: ReferenceKind::Form,
            oid: "F.DEMOG".to_string(),
            study_oid: "S.001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unresolved reference: FormDef 'F.DEMOG' not found in study 'S.001'"
        );
    }

    #[test]
    fn test_recoverable_classes() {
        assert!(OdmError::Io("disk full".to_string()).is_recoverable());
        assert!(OdmError::Value {
            item_oid: "I.AGE".to_string(),
            value: "abc".to_string(),
            reason: "not a decimal".to_string(),
        }
        .is_recoverable());
        assert!(!OdmError::MissingStudy(String::new()).is_recoverable());
        assert!(!OdmError::Protocol("out of order".to_string()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: OdmError = io_err.into();
        assert!(matches!(err, OdmError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: OdmError = toml_err.into();
        assert!(matches!(err, OdmError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = OdmError::Protocol("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
