//! Concept rows produced by the definition walk

use super::ids::ConceptCode;
use serde::Serialize;

/// Hierarchy levels of the concept tree
pub const LEVEL_STUDY: u8 = 1;
pub const LEVEL_EVENT: u8 = 2;
pub const LEVEL_FORM: u8 = 3;
pub const LEVEL_ITEM: u8 = 4;
pub const LEVEL_CODE_LIST_ITEM: u8 = 5;

/// Identity of the study currently being exported
///
/// Handed to every sink before the first row of a study so the sink can
/// name its outputs and clear previous exports of the same study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyScope {
    pub study_oid: String,

    /// Human-readable name from `GlobalVariables/StudyName`
    pub study_name: String,

    pub source_system: String,
}

impl StudyScope {
    pub fn new(
        study_oid: impl Into<String>,
        study_name: impl Into<String>,
        source_system: impl Into<String>,
    ) -> Self {
        Self {
            study_oid: study_oid.into(),
            study_name: study_name.into(),
            source_system: source_system.into(),
        }
    }

    /// `{sourceSystem}:{studyOID}`, unique across source servers
    pub fn study_key(&self) -> String {
        format!("{}:{}", self.source_system, self.study_oid)
    }

    /// Root of every concept path of this study
    pub fn root_path(&self) -> String {
        format!("\\STUDY\\{}\\", self.study_key())
    }

    pub fn root_tooltip(&self) -> String {
        format!("STUDY\\{}", self.study_key())
    }

    /// Study name with spaces replaced by underscores, used for file names
    /// and column headers
    pub fn file_prefix(&self) -> String {
        self.study_name.replace(' ', "_")
    }
}

/// Which definition produced a concept row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Study,
    Event,
    Form,
    Item,
    CodeListItem,
}

/// Folder or leaf display hint (`c_visualattributes`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisualAttribute {
    Folder,
    Leaf,
}

impl VisualAttribute {
    pub fn as_code(self) -> &'static str {
        match self {
            VisualAttribute::Folder => "FA",
            VisualAttribute::Leaf => "LA",
        }
    }
}

/// One node of the linearized definition tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptRow {
    pub kind: ConceptKind,

    /// 1 (study) through 5 (code list item)
    pub level: u8,

    /// Backslash-delimited OID path, terminated by a backslash
    pub full_path: String,

    /// Backslash-delimited path for display
    pub tooltip: String,

    /// Display name
    pub name: String,

    /// Names of the enclosing event and form joined with `+`; empty above
    /// item level
    pub category_path: String,

    /// Present for item and code list item rows
    pub concept_code: Option<ConceptCode>,

    /// Value metadata descriptor for typed leaf items
    pub metadata_xml: Option<String>,

    pub visual: VisualAttribute,

    /// Coded value of a code list item row
    pub coded_value: Option<String>,
}

impl ConceptRow {
    pub fn is_leaf(&self) -> bool {
        self.visual == VisualAttribute::Leaf
    }
}
