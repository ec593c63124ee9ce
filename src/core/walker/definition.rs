//! Definition tree walk
//!
//! Visits Study → StudyEvent → Form → ItemGroup → Item → CodeListItem in
//! pre-order and emits one concept row per visited node. Item groups only
//! contribute their items; they get no row of their own.

use super::{WalkContext, WalkStats};
use crate::adapters::sink::ExportSink;
use crate::core::concept_code::{generate_concept_code, ItemPath};
use crate::core::metadata_xml::{MetadataXmlBuilder, ValueKind};
use crate::domain::concept::{
    LEVEL_CODE_LIST_ITEM, LEVEL_EVENT, LEVEL_FORM, LEVEL_ITEM, LEVEL_STUDY,
};
use crate::domain::odm::{translated_or, CodeList, FormDef, ItemDef, StudyEventDef};
use crate::domain::{ConceptKind, ConceptRow, OdmError, Result, VisualAttribute};

/// Walks the definition tree of one study
pub struct DefinitionWalker<'a> {
    ctx: WalkContext<'a>,
    metadata: &'a MetadataXmlBuilder,
}

/// Position of the walk below the form level
struct FormNode<'a> {
    event: &'a StudyEventDef,
    form: &'a FormDef,
    path: String,
    tooltip: String,
    category_path: String,
}

impl<'a> DefinitionWalker<'a> {
    pub fn new(ctx: WalkContext<'a>, metadata: &'a MetadataXmlBuilder) -> Self {
        Self { ctx, metadata }
    }

    /// Emits the concept rows of the study into `sink`
    ///
    /// # Errors
    ///
    /// Only sink failures propagate; unresolved references are logged,
    /// counted and skipped.
    pub async fn walk(&self, sink: &mut dyn ExportSink) -> Result<WalkStats> {
        let mut stats = WalkStats::default();
        let scope = self.ctx.scope;
        let study_path = scope.root_path();
        let study_tooltip = scope.root_tooltip();

        sink.emit_concept(&ConceptRow {
            kind: ConceptKind::Study,
            level: LEVEL_STUDY,
            full_path: study_path.clone(),
            tooltip: study_tooltip.clone(),
            name: scope.study_name.clone(),
            category_path: String::new(),
            concept_code: None,
            metadata_xml: None,
            visual: VisualAttribute::Folder,
            coded_value: None,
        })
        .await?;
        stats.concepts += 1;

        let Some(protocol) = self.ctx.index.version().protocol.as_ref() else {
            tracing::warn!(study_oid = %scope.study_oid, "Study has no Protocol; no events to export");
            return Ok(stats);
        };

        for event_ref in &protocol.study_event_refs {
            let event = match self.ctx.index.event(&event_ref.study_event_oid) {
                Ok(event) => event,
                Err(e) => {
                    skip(&mut stats, &e);
                    continue;
                }
            };

            let event_path = format!("{study_path}{}\\", event.oid);
            let event_tooltip = format!("{study_tooltip}\\{}", event.oid);

            sink.emit_concept(&ConceptRow {
                kind: ConceptKind::Event,
                level: LEVEL_EVENT,
                full_path: event_path.clone(),
                tooltip: event_tooltip.clone(),
                name: event.name.clone(),
                category_path: String::new(),
                concept_code: None,
                metadata_xml: None,
                visual: VisualAttribute::Folder,
                coded_value: None,
            })
            .await?;
            stats.concepts += 1;

            for form_ref in &event.form_refs {
                let form = match self.ctx.index.form(&form_ref.form_oid) {
                    Ok(form) => form,
                    Err(e) => {
                        skip(&mut stats, &e);
                        continue;
                    }
                };

                let form_name =
                    translated_or(form.description.as_ref(), self.ctx.language, &form.name);
                let node = FormNode {
                    event,
                    form,
                    path: format!("{event_path}{}\\", form.oid),
                    tooltip: format!("{event_tooltip}\\{}", form.oid),
                    category_path: format!("{}+{}", event.name, form_name),
                };

                sink.emit_concept(&ConceptRow {
                    kind: ConceptKind::Form,
                    level: LEVEL_FORM,
                    full_path: node.path.clone(),
                    tooltip: node.tooltip.clone(),
                    name: form_name.to_string(),
                    category_path: String::new(),
                    concept_code: None,
                    metadata_xml: None,
                    visual: VisualAttribute::Folder,
                    coded_value: None,
                })
                .await?;
                stats.concepts += 1;

                self.walk_form(&node, sink, &mut stats).await?;
            }
        }

        Ok(stats)
    }

    async fn walk_form(
        &self,
        node: &FormNode<'a>,
        sink: &mut dyn ExportSink,
        stats: &mut WalkStats,
    ) -> Result<()> {
        for group_ref in &node.form.item_group_refs {
            let group = match self.ctx.index.item_group(&group_ref.item_group_oid) {
                Ok(group) => group,
                Err(e) => {
                    skip(stats, &e);
                    continue;
                }
            };

            for item_ref in &group.item_refs {
                let item = match self.ctx.index.item(&item_ref.item_oid) {
                    Ok(item) => item,
                    Err(e) => {
                        skip(stats, &e);
                        continue;
                    }
                };
                let code_list = match self.ctx.index.code_list_of(item) {
                    Ok(code_list) => code_list,
                    Err(e) => {
                        skip(stats, &e);
                        continue;
                    }
                };

                self.walk_item(node, item, code_list, sink, stats).await?;
            }
        }

        Ok(())
    }

    async fn walk_item(
        &self,
        node: &FormNode<'a>,
        item: &ItemDef,
        code_list: Option<&CodeList>,
        sink: &mut dyn ExportSink,
        stats: &mut WalkStats,
    ) -> Result<()> {
        let scope = self.ctx.scope;
        let language = self.ctx.language;
        let item_path = format!("{}{}\\", node.path, item.oid);
        let item_tooltip = format!("{}\\{}", node.tooltip, item.oid);
        let item_name = translated_or(item.description.as_ref(), language, &item.name);
        let code_path = ItemPath {
            source_system: &scope.source_system,
            study_oid: &scope.study_oid,
            study_event_oid: &node.event.oid,
            form_oid: &node.form.oid,
            item_oid: &item.oid,
        };

        let enum_values = code_list.map(|list| {
            list.items
                .iter()
                .map(|entry| entry.decoded(language).to_string())
                .collect::<Vec<_>>()
        });
        let metadata_xml = ValueKind::for_item(item.data_type(), enum_values)
            .map(|kind| self.metadata.build(&item.oid, &item.name, &kind))
            .transpose()?;

        sink.emit_concept(&ConceptRow {
            kind: ConceptKind::Item,
            level: LEVEL_ITEM,
            full_path: item_path.clone(),
            tooltip: item_tooltip.clone(),
            name: item_name.to_string(),
            category_path: node.category_path.clone(),
            concept_code: Some(generate_concept_code(&code_path, None)),
            metadata_xml,
            visual: if code_list.is_some() {
                VisualAttribute::Folder
            } else {
                VisualAttribute::Leaf
            },
            coded_value: None,
        })
        .await?;
        stats.concepts += 1;

        let Some(code_list) = code_list else {
            return Ok(());
        };

        for entry in &code_list.items {
            let decoded = entry.decoded(language);
            sink.emit_concept(&ConceptRow {
                kind: ConceptKind::CodeListItem,
                level: LEVEL_CODE_LIST_ITEM,
                full_path: format!("{item_path}{}\\", entry.coded_value),
                tooltip: format!("{item_tooltip}\\{decoded}"),
                name: format!("{item_name}: {decoded}"),
                category_path: node.category_path.clone(),
                concept_code: Some(generate_concept_code(&code_path, Some(&entry.coded_value))),
                metadata_xml: None,
                visual: VisualAttribute::Leaf,
                coded_value: Some(entry.coded_value.clone()),
            })
            .await?;
            stats.concepts += 1;
        }

        Ok(())
    }
}

fn skip(stats: &mut WalkStats, err: &OdmError) {
    tracing::error!(error = %err, "Skipping definition with unresolved reference");
    stats.skipped_references += 1;
}
