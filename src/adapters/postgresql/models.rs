//! i2b2 row models
//!
//! This module defines the rows written to the i2b2 metadata table and the
//! observation fact table.

use crate::domain::{ConceptRow, ObservationFact, StudyScope};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const C_SYNONYM_CD: &str = "N";
pub const C_FACTTABLECOLUMN: &str = "concept_cd";
pub const C_TABLENAME: &str = "concept_dimension";
pub const C_COLUMNNAME: &str = "concept_path";
pub const C_COLUMNDATATYPE: &str = "T";
pub const C_OPERATOR: &str = "LIKE";
pub const M_APPLIED_PATH: &str = "@";

pub const PROVIDER_ID: &str = "@";
pub const MODIFIER_CD: &str = "@";
pub const INSTANCE_NUM: i32 = 1;

/// One row of the i2b2 metadata (ontology) table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataRow {
    pub c_hlevel: i32,
    pub c_fullname: String,
    pub c_name: String,
    pub c_synonym_cd: &'static str,
    pub c_visualattributes: &'static str,

    /// Concept code; `None` for study, event and form folders
    pub c_basecode: Option<String>,
    pub c_metadataxml: Option<String>,
    pub c_facttablecolumn: &'static str,
    pub c_tablename: &'static str,
    pub c_columnname: &'static str,
    pub c_columndatatype: &'static str,
    pub c_operator: &'static str,
    pub c_dimcode: String,
    pub c_tooltip: String,
    pub m_applied_path: &'static str,
    pub update_date: DateTime<Utc>,
    pub download_date: DateTime<Utc>,
    pub import_date: DateTime<Utc>,
    pub sourcesystem_cd: String,
}

impl MetadataRow {
    pub fn from_concept(row: &ConceptRow, scope: &StudyScope, loaded_at: DateTime<Utc>) -> Self {
        Self {
            c_hlevel: i32::from(row.level),
            c_fullname: row.full_path.clone(),
            c_name: row.name.clone(),
            c_synonym_cd: C_SYNONYM_CD,
            c_visualattributes: row.visual.as_code(),
            c_basecode: row.concept_code.as_ref().map(|c| c.as_str().to_string()),
            c_metadataxml: row.metadata_xml.clone(),
            c_facttablecolumn: C_FACTTABLECOLUMN,
            c_tablename: C_TABLENAME,
            c_columnname: C_COLUMNNAME,
            c_columndatatype: C_COLUMNDATATYPE,
            c_operator: C_OPERATOR,
            c_dimcode: row.full_path.clone(),
            c_tooltip: row.tooltip.clone(),
            m_applied_path: M_APPLIED_PATH,
            update_date: loaded_at,
            download_date: loaded_at,
            import_date: loaded_at,
            sourcesystem_cd: scope.source_system.clone(),
        }
    }
}

/// One row of the observation fact table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRow {
    pub encounter_num: i32,

    /// Subject key as recorded in the ODM document
    pub patient_num: String,
    pub concept_cd: String,
    pub provider_id: &'static str,
    pub start_date: DateTime<Utc>,
    pub modifier_cd: &'static str,
    pub instance_num: i32,
    pub valtype_cd: &'static str,
    pub tval_char: Option<String>,

    /// Decimal literal, cast to `numeric` by the insert statement
    pub nval_num: Option<String>,
    pub update_date: DateTime<Utc>,
    pub download_date: DateTime<Utc>,
    pub import_date: DateTime<Utc>,
    pub sourcesystem_cd: String,
}

impl ObservationRow {
    pub fn from_fact(fact: &ObservationFact, scope: &StudyScope) -> Self {
        Self {
            encounter_num: fact.encounter_num,
            patient_num: fact.subject_key.as_str().to_string(),
            concept_cd: fact.concept_code.as_str().to_string(),
            provider_id: PROVIDER_ID,
            start_date: fact.recorded_at,
            modifier_cd: MODIFIER_CD,
            instance_num: INSTANCE_NUM,
            valtype_cd: fact.value.value_type().as_code(),
            tval_char: fact.value.text().map(str::to_string),
            nval_num: fact.value.number().map(|n| n.as_str().to_string()),
            update_date: fact.recorded_at,
            download_date: fact.recorded_at,
            import_date: fact.recorded_at,
            sourcesystem_cd: scope.source_system.clone(),
        }
    }
}
