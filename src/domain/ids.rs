//! Domain identifier types with validation
//!
//! Newtype wrappers keep concept codes and subject keys from being mixed up
//! with the many other strings that flow through an export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum width of the warehouse `concept_cd` column
pub const CONCEPT_CODE_MAX_LEN: usize = 50;

/// Concept code newtype wrapper
///
/// Identifies one concept row and joins observation facts to it.
/// Produced by [`crate::core::concept_code::generate_concept_code`].
///
/// # Examples
///
/// ```
/// use odm_i2b2::domain::ids::ConceptCode;
///
/// let code = ConceptCode::new("STUDY|S1|0f3a").unwrap();
/// assert_eq!(code.as_str(), "STUDY|S1|0f3a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptCode(String);

impl ConceptCode {
    /// Creates a new ConceptCode from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(ConceptCode)` if the code is non-empty, `Err` otherwise
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err("Concept code cannot be empty".to_string());
        }
        Ok(Self(code))
    }

    /// Wraps a code that is non-empty and fits the column by construction
    pub(crate) fn from_generated(code: String) -> Self {
        debug_assert!(code.len() <= CONCEPT_CODE_MAX_LEN, "generated code '{code}' too long");
        Self(code)
    }

    /// Returns the concept code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code fits the warehouse column width
    pub fn fits_column(&self) -> bool {
        self.0.len() <= CONCEPT_CODE_MAX_LEN
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConceptCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ConceptCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Subject key newtype wrapper
///
/// The `SubjectKey` attribute of an ODM `SubjectData` record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKey(String);

impl SubjectKey {
    /// Creates a new SubjectKey from a string
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("Subject key cannot be empty".to_string());
        }
        Ok(Self(key))
    }

    /// Returns the subject key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubjectKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SubjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_code_creation() {
        let code = ConceptCode::new("STUDY|S1|abc").unwrap();
        assert_eq!(code.as_str(), "STUDY|S1|abc");
        assert_eq!(format!("{code}"), "STUDY|S1|abc");
    }

    #[test]
    fn test_concept_code_empty_fails() {
        assert!(ConceptCode::new("").is_err());
        assert!(ConceptCode::new("   ").is_err());
    }

    #[test]
    fn test_concept_code_column_width() {
        assert!(ConceptCode::new("STUDY|S1|abc").unwrap().fits_column());
        assert!(!ConceptCode::new("x".repeat(51)).unwrap().fits_column());
    }

    #[test]
    fn test_subject_key_from_str() {
        let key: SubjectKey = "SUBJ-001".parse().unwrap();
        assert_eq!(key.as_str(), "SUBJ-001");
        assert!(SubjectKey::new("").is_err());
    }

    #[test]
    fn test_concept_code_serialization() {
        let code = ConceptCode::new("STUDY|S1|abc").unwrap();
        let json = serde_json::to_string(&code).unwrap();
        let deserialized: ConceptCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, deserialized);
    }
}
