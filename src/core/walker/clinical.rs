//! Clinical data walk
//!
//! Visits Subject → StudyEventData → FormData → ItemGroupData → ItemData and
//! emits one observation fact per recorded value. Each value is classified
//! by its item definition: coded (resolved through the code list), numeric
//! or free text.

use super::{WalkContext, WalkStats};
use crate::adapters::sink::ExportSink;
use crate::core::concept_code::{generate_concept_code, ItemPath};
use crate::domain::odm::{ClinicalData, ItemData, SubjectData};
use crate::domain::{
    FactValue, NumericValue, ObservationFact, OdmError, Result, SubjectKey,
};
use chrono::{DateTime, Utc};

/// Walks the clinical data records of one study
pub struct ClinicalDataWalker<'a> {
    ctx: WalkContext<'a>,
    recorded_at: DateTime<Utc>,
}

/// Position of the walk at one recorded item
struct ItemSite<'a> {
    subject_key: &'a SubjectKey,
    encounter_num: i32,
    study_event_oid: &'a str,
    form_oid: &'a str,
}

impl<'a> ClinicalDataWalker<'a> {
    /// `recorded_at` stamps every fact; pass the engine-start time
    pub fn new(ctx: WalkContext<'a>, recorded_at: DateTime<Utc>) -> Self {
        Self { ctx, recorded_at }
    }

    /// Emits the facts of one `ClinicalData` block into `sink`
    ///
    /// Encounter numbers start at 1 for each block and advance once per
    /// subject that has at least one event.
    ///
    /// # Errors
    ///
    /// Only sink failures propagate; unresolved references and unsupported
    /// values are logged, counted and skipped.
    pub async fn walk(
        &self,
        clinical_data: &ClinicalData,
        sink: &mut dyn ExportSink,
    ) -> Result<WalkStats> {
        let mut stats = WalkStats::default();
        let mut encounter_num = 0;

        for subject in &clinical_data.subjects {
            if subject.events.is_empty() {
                tracing::debug!(subject_key = %subject.subject_key, "Subject has no events; skipping");
                continue;
            }

            let subject_key = match SubjectKey::new(subject.subject_key.as_str()) {
                Ok(key) => key,
                Err(e) => {
                    tracing::error!(study_oid = %self.ctx.scope.study_oid, error = %e, "Skipping subject");
                    stats.skipped_references += 1;
                    continue;
                }
            };

            encounter_num += 1;
            stats.subjects += 1;
            self.walk_subject(subject, &subject_key, encounter_num, sink, &mut stats)
                .await?;
        }

        Ok(stats)
    }

    async fn walk_subject(
        &self,
        subject: &SubjectData,
        subject_key: &SubjectKey,
        encounter_num: i32,
        sink: &mut dyn ExportSink,
        stats: &mut WalkStats,
    ) -> Result<()> {
        for event in &subject.events {
            for form in &event.forms {
                let site = ItemSite {
                    subject_key,
                    encounter_num,
                    study_event_oid: &event.study_event_oid,
                    form_oid: &form.form_oid,
                };

                for group in &form.item_groups {
                    for item in &group.items {
                        let Some(raw_value) = item.recorded_value() else {
                            continue;
                        };

                        match self.classify(&site, item, raw_value) {
                            Ok(fact) => {
                                sink.emit_fact(&fact).await?;
                                stats.facts += 1;
                            }
                            Err(e @ OdmError::Reference { .. }) => {
                                tracing::error!(
                                    subject_key = %subject_key,
                                    error = %e,
                                    "Skipping item data with unresolved reference"
                                );
                                stats.skipped_references += 1;
                            }
                            Err(e) if e.is_recoverable() => {
                                tracing::error!(
                                    subject_key = %subject_key,
                                    error = %e,
                                    "Dropping observation"
                                );
                                stats.dropped_facts += 1;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Builds the fact for one recorded value
    fn classify(&self, site: &ItemSite<'_>, item: &ItemData, raw_value: &str) -> Result<ObservationFact> {
        let scope = self.ctx.scope;
        let definition = self.ctx.index.item(&item.item_oid)?;
        let path = ItemPath {
            source_system: &scope.source_system,
            study_oid: &scope.study_oid,
            study_event_oid: site.study_event_oid,
            form_oid: site.form_oid,
            item_oid: &item.item_oid,
        };
        let column_code = generate_concept_code(&path, None);

        let (concept_code, value) = match self.ctx.index.code_list_of(definition)? {
            Some(code_list) => {
                let entry = code_list.item(raw_value).ok_or_else(|| OdmError::Value {
                    item_oid: item.item_oid.clone(),
                    value: raw_value.to_string(),
                    reason: format!("no entry in code list '{}'", code_list.oid),
                })?;
                (
                    generate_concept_code(&path, Some(raw_value)),
                    FactValue::Text(entry.decoded(self.ctx.language).to_string()),
                )
            }
            None if definition.data_type().is_numeric() => {
                let number = NumericValue::parse(raw_value).map_err(|reason| OdmError::Value {
                    item_oid: item.item_oid.clone(),
                    value: raw_value.to_string(),
                    reason: format!("{reason} (declared {})", definition.data_type),
                })?;
                (column_code.clone(), FactValue::Numeric(number))
            }
            None => (column_code.clone(), FactValue::Text(raw_value.to_string())),
        };

        Ok(ObservationFact {
            subject_key: site.subject_key.clone(),
            encounter_num: site.encounter_num,
            concept_code,
            column_code,
            item_oid: item.item_oid.clone(),
            raw_value: raw_value.to_string(),
            value,
            recorded_at: self.recorded_at,
        })
    }
}
