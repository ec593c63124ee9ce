//! Value metadata descriptors
//!
//! i2b2 attaches a `ValueMetadata` XML blob to typed leaf concepts so the
//! query tool knows how to constrain values. The blob is a fixed template;
//! only the test identity, data type and enumeration values vary.

use crate::domain::odm::ItemDataType;
use crate::domain::{OdmError, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

const METADATA_VERSION: &str = "3.02";

/// Data type slot of the descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    String,
    /// Coded item, with the decoded values in code list order
    Enum(Vec<String>),
}

impl ValueKind {
    /// Maps an ODM item type to a descriptor type
    ///
    /// Returns `None` for types that get no descriptor (boolean and the
    /// binary/partial forms).
    pub fn for_item(data_type: ItemDataType, enum_values: Option<Vec<String>>) -> Option<Self> {
        match data_type {
            ItemDataType::Integer => Some(Self::Integer),
            ItemDataType::Float | ItemDataType::Double => Some(Self::Float),
            ItemDataType::Text | ItemDataType::String => match enum_values {
                Some(values) => Some(Self::Enum(values)),
                None => Some(Self::String),
            },
            ItemDataType::Date | ItemDataType::Time | ItemDataType::DateTime => {
                Some(Self::String)
            }
            ItemDataType::Boolean | ItemDataType::Other => None,
        }
    }

    fn data_type_name(&self) -> &'static str {
        match self {
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
            ValueKind::Enum(_) => "Enum",
        }
    }
}

/// Renders value metadata descriptors stamped with one creation time
#[derive(Debug, Clone)]
pub struct MetadataXmlBuilder {
    creation_date_time: String,
}

impl MetadataXmlBuilder {
    /// `created_at` is the engine-start time so repeated runs over the same
    /// input can be made byte-identical
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            creation_date_time: created_at.format("%a %b %d %H:%M:%S UTC %Y").to_string(),
        }
    }

    /// Builds the descriptor for one item
    ///
    /// # Errors
    ///
    /// Returns `OdmError::Serialization` if the XML cannot be written.
    pub fn build(&self, item_oid: &str, item_name: &str, kind: &ValueKind) -> Result<String> {
        let mut xml = Writer::new(Vec::new());

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        xml.get_mut().push(b'\n');

        start(&mut xml, "ValueMetadata")?;
        text_element(&mut xml, "Version", METADATA_VERSION)?;
        text_element(&mut xml, "CreationDateTime", &self.creation_date_time)?;
        text_element(&mut xml, "TestID", item_oid)?;
        text_element(&mut xml, "TestName", item_name)?;
        text_element(&mut xml, "DataType", kind.data_type_name())?;
        text_element(&mut xml, "CodeType", "GRP")?;
        text_element(&mut xml, "Loinc", "1")?;
        empty(&mut xml, "Flagstouse")?;
        text_element(&mut xml, "Oktousevalues", "N")?;
        for name in [
            "MaxStringLength",
            "LowofLowValue",
            "HighofLowValue",
            "LowofHighValue",
            "HighofHighValue",
            "LowofToxicValue",
            "HighofToxicValue",
        ] {
            empty(&mut xml, name)?;
        }

        match kind {
            ValueKind::Enum(values) => {
                start(&mut xml, "EnumValues")?;
                for value in values {
                    text_element(&mut xml, "Val", value)?;
                }
                end(&mut xml, "EnumValues")?;
            }
            _ => empty(&mut xml, "EnumValues")?,
        }

        start(&mut xml, "CommentsDeterminingExclusion")?;
        empty(&mut xml, "Com")?;
        end(&mut xml, "CommentsDeterminingExclusion")?;

        start(&mut xml, "UnitValues")?;
        text_element(&mut xml, "NormalUnits", "N/A")?;
        text_element(&mut xml, "EqualUnits", "N/A")?;
        empty(&mut xml, "ExcludingUnits")?;
        start(&mut xml, "ConvertingUnits")?;
        empty(&mut xml, "Units")?;
        empty(&mut xml, "MultiplyingFactor")?;
        end(&mut xml, "ConvertingUnits")?;
        end(&mut xml, "UnitValues")?;

        start(&mut xml, "Analysis")?;
        empty(&mut xml, "Enums")?;
        empty(&mut xml, "Counts")?;
        empty(&mut xml, "New")?;
        end(&mut xml, "Analysis")?;

        end(&mut xml, "ValueMetadata")?;

        let mut bytes = xml.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| OdmError::Serialization(e.to_string()))
    }
}

fn xml_error(err: impl std::fmt::Display) -> OdmError {
    OdmError::Serialization(format!("value metadata: {err}"))
}

fn start(xml: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end(xml: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    xml.write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn empty(xml: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    xml.write_event(Event::Empty(BytesStart::new(name)))
        .map_err(xml_error)
}

fn text_element(xml: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(xml, name)?;
    xml.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    end(xml, name)
}
