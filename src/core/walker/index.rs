//! OID lookup tables of one study
//!
//! Built once per study from its first `MetaDataVersion`. Every cross
//! reference the walkers follow (event → form → item group → item →
//! code list) resolves through these maps.

use crate::domain::odm::{
    CodeList, FormDef, ItemDef, ItemGroupDef, MetaDataVersion, Study, StudyEventDef,
};
use crate::domain::{OdmError, ReferenceKind, Result};
use std::collections::HashMap;

#[derive(Debug)]
pub struct StudyIndex<'a> {
    study: &'a Study,
    version: &'a MetaDataVersion,
    events: HashMap<&'a str, &'a StudyEventDef>,
    forms: HashMap<&'a str, &'a FormDef>,
    item_groups: HashMap<&'a str, &'a ItemGroupDef>,
    items: HashMap<&'a str, &'a ItemDef>,
    code_lists: HashMap<&'a str, &'a CodeList>,
}

impl<'a> StudyIndex<'a> {
    /// Indexes the first metadata version of `study`
    ///
    /// When an OID is defined twice the first definition wins.
    ///
    /// # Errors
    ///
    /// Returns `OdmError::Reference` if the study has no metadata version.
    pub fn build(study: &'a Study) -> Result<Self> {
        let version = study
            .metadata_versions
            .first()
            .ok_or_else(|| OdmError::Reference {
                kind: ReferenceKind::MetaDataVersion,
                oid: String::new(),
                study_oid: study.oid.clone(),
            })?;

        let index = Self {
            study,
            version,
            events: table(&version.study_event_defs, |d| &d.oid),
            forms: table(&version.form_defs, |d| &d.oid),
            item_groups: table(&version.item_group_defs, |d| &d.oid),
            items: table(&version.item_defs, |d| &d.oid),
            code_lists: table(&version.code_lists, |d| &d.oid),
        };

        tracing::debug!(
            study_oid = %study.oid,
            metadata_version = %version.oid,
            events = index.events.len(),
            forms = index.forms.len(),
            item_groups = index.item_groups.len(),
            items = index.items.len(),
            code_lists = index.code_lists.len(),
            "Built study index"
        );

        Ok(index)
    }

    pub fn study(&self) -> &'a Study {
        self.study
    }

    pub fn version(&self) -> &'a MetaDataVersion {
        self.version
    }

    pub fn event(&self, oid: &str) -> Result<&'a StudyEventDef> {
        self.lookup(&self.events, ReferenceKind::StudyEvent, oid)
    }

    pub fn form(&self, oid: &str) -> Result<&'a FormDef> {
        self.lookup(&self.forms, ReferenceKind::Form, oid)
    }

    pub fn item_group(&self, oid: &str) -> Result<&'a ItemGroupDef> {
        self.lookup(&self.item_groups, ReferenceKind::ItemGroup, oid)
    }

    pub fn item(&self, oid: &str) -> Result<&'a ItemDef> {
        self.lookup(&self.items, ReferenceKind::Item, oid)
    }

    pub fn code_list(&self, oid: &str) -> Result<&'a CodeList> {
        self.lookup(&self.code_lists, ReferenceKind::CodeList, oid)
    }

    /// Code list referenced by `item`, if it has one
    pub fn code_list_of(&self, item: &ItemDef) -> Result<Option<&'a CodeList>> {
        item.code_list_ref
            .as_ref()
            .map(|r| self.code_list(&r.code_list_oid))
            .transpose()
    }

    fn lookup<T>(
        &self,
        table: &HashMap<&'a str, &'a T>,
        kind: ReferenceKind,
        oid: &str,
    ) -> Result<&'a T> {
        table.get(oid).copied().ok_or_else(|| OdmError::Reference {
            kind,
            oid: oid.to_string(),
            study_oid: self.study.oid.clone(),
        })
    }
}

fn table<'a, T>(defs: &'a [T], oid: impl Fn(&'a T) -> &'a String) -> HashMap<&'a str, &'a T> {
    let mut map = HashMap::with_capacity(defs.len());
    for def in defs {
        map.entry(oid(def).as_str()).or_insert(def);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::odm::{CodeListRef, FormRef};

    fn study() -> Study {
        Study {
            oid: "S1".to_string(),
            metadata_versions: vec![MetaDataVersion {
                oid: "v1".to_string(),
                study_event_defs: vec![StudyEventDef {
                    oid: "SE1".to_string(),
                    name: "Baseline".to_string(),
                    form_refs: vec![FormRef {
                        form_oid: "F1".to_string(),
                    }],
                    ..Default::default()
                }],
                form_defs: vec![
                    FormDef {
                        oid: "F1".to_string(),
                        name: "First".to_string(),
                        ..Default::default()
                    },
                    FormDef {
                        oid: "F1".to_string(),
                        name: "Duplicate".to_string(),
                        ..Default::default()
                    },
                ],
                item_defs: vec![ItemDef {
                    oid: "I1".to_string(),
                    name: "SEX".to_string(),
                    data_type: "text".to_string(),
                    code_list_ref: Some(CodeListRef {
                        code_list_oid: "CL.MISSING".to_string(),
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_resolves_and_first_definition_wins() {
        let study = study();
        let index = StudyIndex::build(&study).unwrap();
        assert_eq!(index.event("SE1").unwrap().name, "Baseline");
        assert_eq!(index.form("F1").unwrap().name, "First");
    }

    #[test]
    fn test_unresolved_reference_names_kind() {
        let study = study();
        let index = StudyIndex::build(&study).unwrap();
        let err = index.form("F.NOPE").unwrap_err();
        assert!(matches!(
            err,
            OdmError::Reference {
                kind: ReferenceKind::Form,
                ..
            }
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_dangling_code_list_ref() {
        let study = study();
        let index = StudyIndex::build(&study).unwrap();
        let item = index.item("I1").unwrap();
        assert!(index.code_list_of(item).is_err());
    }

    #[test]
    fn test_study_without_metadata_version() {
        let study = Study {
            oid: "S2".to_string(),
            ..Default::default()
        };
        assert!(StudyIndex::build(&study).is_err());
    }
}
