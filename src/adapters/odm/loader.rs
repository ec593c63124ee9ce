//! ODM XML loading
//!
//! Reads an ODM 1.3 document into the domain model with quick-xml's serde
//! deserializer. Elements and attributes the exporter does not use are
//! ignored.

use crate::domain::{OdmDocument, OdmError, Result};
use std::path::Path;

/// Parses an ODM document from a string
///
/// # Errors
///
/// Returns `OdmError::Parse` for malformed XML and `OdmError::MissingStudy`
/// when the document defines no study.
pub fn parse_document(xml: &str) -> Result<OdmDocument> {
    let document: OdmDocument = quick_xml::de::from_str(xml)?;
    ensure_studies(document, "")
}

/// Reads and parses an ODM file
///
/// # Errors
///
/// Returns `OdmError::Io` if the file cannot be read, otherwise the errors of
/// [`parse_document`].
pub async fn load_document(path: &Path) -> Result<OdmDocument> {
    tracing::info!(path = %path.display(), "Loading ODM document");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| OdmError::Io(format!("Failed to read '{}': {e}", path.display())))?;

    let document: OdmDocument = quick_xml::de::from_str(&content)
        .map_err(|e| OdmError::Parse(format!("'{}': {e}", path.display())))?;
    let document = ensure_studies(document, &format!(" '{}'", path.display()))?;

    tracing::info!(
        path = %path.display(),
        studies = document.studies.len(),
        clinical_data_blocks = document.clinical_data.len(),
        source_system = document.source_system.as_deref().unwrap_or(""),
        "Loaded ODM document"
    );

    Ok(document)
}

fn ensure_studies(document: OdmDocument, origin: &str) -> Result<OdmDocument> {
    if document.studies.is_empty() {
        return Err(OdmError::MissingStudy(origin.to_string()));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3" SourceSystem="OC">
  <Study OID="S1">
    <GlobalVariables><StudyName>Minimal</StudyName></GlobalVariables>
    <MetaDataVersion OID="v1">
      <ItemDef OID="I1" Name="WEIGHT" DataType="float"/>
      <FormDef OID="F1" Name="Vitals"><ItemGroupRef ItemGroupOID="IG1" Mandatory="Yes"/></FormDef>
      <ItemDef OID="I2" Name="HEIGHT" DataType="float"/>
    </MetaDataVersion>
  </Study>
</ODM>"#;

    #[test]
    fn test_parse_minimal_document() {
        let document = parse_document(MINIMAL).unwrap();
        assert_eq!(document.source_system.as_deref(), Some("OC"));
        assert_eq!(document.studies.len(), 1);
        assert_eq!(document.studies[0].name(), "Minimal");
        assert!(document.clinical_data.is_empty());
    }

    #[test]
    fn test_interleaved_definitions_are_collected() {
        let document = parse_document(MINIMAL).unwrap();
        let version = &document.studies[0].metadata_versions[0];
        assert_eq!(version.item_defs.len(), 2);
        assert_eq!(version.form_defs.len(), 1);
    }

    #[test]
    fn test_demo_fixture() {
        let document = parse_document(crate::core::walker::testing::DEMO_XML).unwrap();
        let version = &document.studies[0].metadata_versions[0];
        let form = &version.form_defs[0];
        assert_eq!(
            form.description.as_ref().and_then(|d| d.translated("en")),
            Some("Demographics")
        );
        assert_eq!(version.code_lists[0].items.len(), 2);
        assert_eq!(document.clinical_data.len(), 2);
        assert_eq!(document.clinical_data[0].subjects.len(), 5);
        assert!(document.clinical_data[0].subjects[2].events.is_empty());
        assert_eq!(
            document.clinical_data[0].subjects[0].events[0].forms[0].item_groups[0].items[1]
                .recorded_value(),
            Some("M")
        );
    }

    #[test]
    fn test_document_without_study_is_fatal() {
        let err = parse_document(r#"<ODM SourceSystem="OC"></ODM>"#).unwrap_err();
        assert!(matches!(err, OdmError::MissingStudy(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_document("<ODM><Study OID=\"S1\">").unwrap_err();
        assert!(matches!(err, OdmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_load_document_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let document = load_document(file.path()).await.unwrap();
        assert_eq!(document.studies[0].oid, "S1");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_document(Path::new("/nonexistent/odm.xml"))
            .await
            .unwrap_err();
        assert!(matches!(err, OdmError::Io(_)));
    }
}
