//! Observation facts produced by the clinical data walk

use super::ids::{ConceptCode, SubjectKey};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static DECIMAL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("decimal literal pattern")
});

/// A validated decimal literal
///
/// Kept as text so the exact digits from the source document reach the
/// warehouse unchanged; the database casts it to `numeric` on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericValue(String);

impl NumericValue {
    /// Parses a recorded value of a numeric item
    ///
    /// # Returns
    ///
    /// `Ok(None)` for a blank value, `Ok(Some(_))` for a decimal literal and
    /// `Err` with a reason otherwise.
    pub fn parse(raw: &str) -> Result<Option<Self>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if DECIMAL_LITERAL.is_match(trimmed) {
            Ok(Some(Self(trimmed.to_string())))
        } else {
            Err("not a decimal number".to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `valtype_cd` of an observation fact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueType {
    Numeric,
    Text,
}

impl ValueType {
    pub fn as_code(self) -> &'static str {
        match self {
            ValueType::Numeric => "N",
            ValueType::Text => "T",
        }
    }
}

/// Typed value of a fact; exactly one of numeric or text is populated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FactValue {
    /// `None` when the recorded value was blank
    Numeric(Option<NumericValue>),

    /// Free text verbatim, or the decoded text of a coded value
    Text(String),
}

impl FactValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            FactValue::Numeric(_) => ValueType::Numeric,
            FactValue::Text(_) => ValueType::Text,
        }
    }

    /// `tval_char`: `E` (equals) for numbers, the text otherwise
    pub fn text(&self) -> Option<&str> {
        match self {
            FactValue::Numeric(_) => Some("E"),
            FactValue::Text(text) => Some(text),
        }
    }

    /// `nval_num`
    pub fn number(&self) -> Option<&NumericValue> {
        match self {
            FactValue::Numeric(value) => value.as_ref(),
            FactValue::Text(_) => None,
        }
    }
}

/// One observed value for one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationFact {
    pub subject_key: SubjectKey,

    /// Per-subject encounter number, starting at 1
    pub encounter_num: i32,

    /// Concept the fact is recorded against; for coded items this is the
    /// code list item concept
    pub concept_code: ConceptCode,

    /// Concept of the item itself, which identifies the clinical data column
    pub column_code: ConceptCode,

    pub item_oid: String,

    /// Value as it appears in the source document
    pub raw_value: String,

    pub value: FactValue,

    /// Engine-start time, used for every timestamp of the fact
    pub recorded_at: DateTime<Utc>,
}
