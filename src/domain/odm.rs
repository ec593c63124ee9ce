//! CDISC ODM document model
//!
//! The subset of ODM 1.3 the exporter reads: study definitions
//! (GlobalVariables, MetaDataVersion and its definition tables) and the
//! parallel ClinicalData records. Field names map one to one to ODM element
//! and attribute names; attributes carry the `@` prefix used by quick-xml's
//! serde integration.
//!
//! The model is read-only once loaded. Definitions reference each other by
//! OID; resolution happens through [`crate::core::walker::StudyIndex`].

use serde::Deserialize;

/// Root `ODM` element
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "ODM")]
pub struct OdmDocument {
    #[serde(rename = "@FileOID", default)]
    pub file_oid: Option<String>,

    #[serde(rename = "@SourceSystem", default)]
    pub source_system: Option<String>,

    #[serde(rename = "@CreationDateTime", default)]
    pub creation_date_time: Option<String>,

    #[serde(rename = "Study", default)]
    pub studies: Vec<Study>,

    #[serde(rename = "ClinicalData", default)]
    pub clinical_data: Vec<ClinicalData>,
}

impl OdmDocument {
    /// Looks up a study by OID
    pub fn study(&self, oid: &str) -> Option<&Study> {
        self.studies.iter().find(|s| s.oid == oid)
    }
}

/// `Study` element
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Study {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "GlobalVariables", default)]
    pub global_variables: GlobalVariables,

    #[serde(rename = "MetaDataVersion", default)]
    pub metadata_versions: Vec<MetaDataVersion>,
}

impl Study {
    /// Human-readable study name, falling back to the OID
    pub fn name(&self) -> &str {
        let name = self.global_variables.study_name.trim();
        if name.is_empty() {
            &self.oid
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalVariables {
    #[serde(rename = "StudyName", default)]
    pub study_name: String,

    #[serde(rename = "StudyDescription", default)]
    pub study_description: Option<String>,

    #[serde(rename = "ProtocolName", default)]
    pub protocol_name: Option<String>,
}

/// `MetaDataVersion` element holding the definition tables of a study
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaDataVersion {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name", default)]
    pub name: Option<String>,

    #[serde(rename = "Protocol", default)]
    pub protocol: Option<Protocol>,

    #[serde(rename = "StudyEventDef", default)]
    pub study_event_defs: Vec<StudyEventDef>,

    #[serde(rename = "FormDef", default)]
    pub form_defs: Vec<FormDef>,

    #[serde(rename = "ItemGroupDef", default)]
    pub item_group_defs: Vec<ItemGroupDef>,

    #[serde(rename = "ItemDef", default)]
    pub item_defs: Vec<ItemDef>,

    #[serde(rename = "CodeList", default)]
    pub code_lists: Vec<CodeList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Protocol {
    #[serde(rename = "StudyEventRef", default)]
    pub study_event_refs: Vec<StudyEventRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudyEventRef {
    #[serde(rename = "@StudyEventOID")]
    pub study_event_oid: String,

    #[serde(rename = "@OrderNumber", default)]
    pub order_number: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyEventDef {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@Repeating", default)]
    pub repeating: Option<String>,

    #[serde(rename = "Description", default)]
    pub description: Option<Description>,

    #[serde(rename = "FormRef", default)]
    pub form_refs: Vec<FormRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormRef {
    #[serde(rename = "@FormOID")]
    pub form_oid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormDef {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: Option<Description>,

    #[serde(rename = "ItemGroupRef", default)]
    pub item_group_refs: Vec<ItemGroupRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemGroupRef {
    #[serde(rename = "@ItemGroupOID")]
    pub item_group_oid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemGroupDef {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name", default)]
    pub name: String,

    #[serde(rename = "ItemRef", default)]
    pub item_refs: Vec<ItemRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "@ItemOID")]
    pub item_oid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDef {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name")]
    pub name: String,

    #[serde(rename = "@DataType")]
    pub data_type: String,

    #[serde(rename = "Description", default)]
    pub description: Option<Description>,

    #[serde(rename = "CodeListRef", default)]
    pub code_list_ref: Option<CodeListRef>,
}

impl ItemDef {
    /// Declared data type, parsed
    pub fn data_type(&self) -> ItemDataType {
        ItemDataType::parse(&self.data_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeListRef {
    #[serde(rename = "@CodeListOID")]
    pub code_list_oid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeList {
    #[serde(rename = "@OID")]
    pub oid: String,

    #[serde(rename = "@Name", default)]
    pub name: String,

    #[serde(rename = "@DataType", default)]
    pub data_type: Option<String>,

    #[serde(rename = "CodeListItem", default)]
    pub items: Vec<CodeListItem>,
}

impl CodeList {
    /// Finds the entry for a coded value
    pub fn item(&self, coded_value: &str) -> Option<&CodeListItem> {
        self.items.iter().find(|i| i.coded_value == coded_value)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodeListItem {
    #[serde(rename = "@CodedValue")]
    pub coded_value: String,

    #[serde(rename = "Decode", default)]
    pub decode: Option<Description>,
}

impl CodeListItem {
    /// Display text for this code
    ///
    /// Prefers the translation in `lang`, then the first translation, then
    /// the coded value itself.
    pub fn decoded(&self, lang: &str) -> &str {
        self.decode
            .as_ref()
            .and_then(|d| d.translated(lang).or_else(|| d.first()))
            .unwrap_or(self.coded_value.as_str())
    }
}

/// `Description` or `Decode` element: a set of translations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Description {
    #[serde(rename = "TranslatedText", default)]
    pub translations: Vec<TranslatedText>,
}

impl Description {
    /// The translation tagged with exactly `lang`
    pub fn translated(&self, lang: &str) -> Option<&str> {
        self.translations
            .iter()
            .find(|t| t.lang.as_deref() == Some(lang))
            .map(|t| t.text.as_str())
    }

    pub fn first(&self) -> Option<&str> {
        self.translations.first().map(|t| t.text.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatedText {
    #[serde(rename = "@lang", default)]
    pub lang: Option<String>,

    #[serde(rename = "$text", default)]
    pub text: String,
}

/// Picks the `Description` translation in `lang` or falls back to `default`
pub fn translated_or<'a>(description: Option<&'a Description>, lang: &str, default: &'a str) -> &'a str {
    description
        .and_then(|d| d.translated(lang))
        .unwrap_or(default)
}

/// ODM item data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDataType {
    Integer,
    Float,
    Double,
    Text,
    String,
    Boolean,
    Date,
    Time,
    DateTime,
    /// Any other declared type (hexBinary, partialDate, URI, ...)
    Other,
}

impl ItemDataType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "integer" => Self::Integer,
            "float" => Self::Float,
            "double" => Self::Double,
            "text" => Self::Text,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            _ => Self::Other,
        }
    }

    /// Values of these types are stored as numbers
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Double)
    }
}

/// `ClinicalData` element: the observed values for one study
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClinicalData {
    #[serde(rename = "@StudyOID")]
    pub study_oid: String,

    #[serde(rename = "@MetaDataVersionOID", default)]
    pub metadata_version_oid: Option<String>,

    #[serde(rename = "SubjectData", default)]
    pub subjects: Vec<SubjectData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectData {
    #[serde(rename = "@SubjectKey")]
    pub subject_key: String,

    #[serde(rename = "StudyEventData", default)]
    pub events: Vec<StudyEventData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyEventData {
    #[serde(rename = "@StudyEventOID")]
    pub study_event_oid: String,

    #[serde(rename = "@StudyEventRepeatKey", default)]
    pub repeat_key: Option<String>,

    #[serde(rename = "FormData", default)]
    pub forms: Vec<FormData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormData {
    #[serde(rename = "@FormOID")]
    pub form_oid: String,

    #[serde(rename = "ItemGroupData", default)]
    pub item_groups: Vec<ItemGroupData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemGroupData {
    #[serde(rename = "@ItemGroupOID")]
    pub item_group_oid: String,

    #[serde(rename = "ItemData", default)]
    pub items: Vec<ItemData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemData {
    #[serde(rename = "@ItemOID")]
    pub item_oid: String,

    #[serde(rename = "@Value", default)]
    pub value: Option<String>,

    #[serde(rename = "@IsNull", default)]
    pub is_null: Option<String>,
}

impl ItemData {
    /// The recorded value, or `None` when the item was explicitly null or
    /// carries no value attribute
    pub fn recorded_value(&self) -> Option<&str> {
        if self.is_null.as_deref() == Some("Yes") {
            return None;
        }
        self.value.as_deref()
    }
}
