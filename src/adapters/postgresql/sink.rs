//! PostgreSQL export sink
//!
//! Buffers metadata and observation rows and writes them in batches. A batch
//! is written when it reaches `batch_size` and whenever a study is flushed,
//! so no batch ever spans two studies.

use super::client::PostgreSQLClient;
use super::models::{MetadataRow, ObservationRow};
use crate::adapters::sink::ExportSink;
use crate::core::concept_code::study_code_prefix;
use crate::domain::{ConceptRow, ObservationFact, OdmError, Result, StudyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub struct PostgreSQLSink {
    client: PostgreSQLClient,
    batch_size: usize,
    scope: Option<StudyScope>,
    loaded_at: DateTime<Utc>,
    metadata_batch: Vec<MetadataRow>,
    observation_batch: Vec<ObservationRow>,
    write_failures: usize,
}

impl PostgreSQLSink {
    pub fn new(client: PostgreSQLClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            scope: None,
            loaded_at: DateTime::default(),
            metadata_batch: Vec::new(),
            observation_batch: Vec::new(),
            write_failures: 0,
        }
    }

    /// Makes `scope` the current study; its metadata rows are stamped with
    /// `started_at`
    fn activate(&mut self, scope: &StudyScope, started_at: DateTime<Utc>) {
        self.loaded_at = started_at;
        self.scope = Some(scope.clone());
    }

    fn scope(&self) -> Result<&StudyScope> {
        self.scope
            .as_ref()
            .ok_or_else(|| OdmError::Protocol("no study has been started".to_string()))
    }

    /// Queues one metadata row, writing the batch when it is full
    pub async fn insert_metadata(&mut self, row: MetadataRow) -> Result<()> {
        self.metadata_batch.push(row);
        if self.metadata_batch.len() >= self.batch_size {
            self.execute_batch().await?;
        }
        Ok(())
    }

    /// Queues one observation row, writing the batch when it is full
    pub async fn insert_observation(&mut self, row: ObservationRow) -> Result<()> {
        self.observation_batch.push(row);
        if self.observation_batch.len() >= self.batch_size {
            self.execute_batch().await?;
        }
        Ok(())
    }

    /// Writes all queued rows, metadata first
    ///
    /// Rows that fail are logged and counted; the rest of the batch is still
    /// written. The queues are empty afterwards whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be obtained or a statement
    /// cannot be prepared.
    pub async fn execute_batch(&mut self) -> Result<()> {
        let metadata = std::mem::take(&mut self.metadata_batch);
        let observations = std::mem::take(&mut self.observation_batch);
        if metadata.is_empty() && observations.is_empty() {
            return Ok(());
        }

        let config = self.client.config();
        let metadata_sql = metadata_insert_sql(&config.metadata_table);
        let observation_sql = observation_insert_sql(&config.fact_table);

        let connection = self.client.get_connection().await?;
        let mut written = 0usize;

        if !metadata.is_empty() {
            let statement = connection
                .prepare(&metadata_sql)
                .await
                .map_err(|e| OdmError::Database(format!("Failed to prepare insert: {e}")))?;

            for row in &metadata {
                let result = connection
                    .execute(
                        &statement,
                        &[
                            &row.c_hlevel,
                            &row.c_fullname,
                            &row.c_name,
                            &row.c_synonym_cd,
                            &row.c_visualattributes,
                            &row.c_basecode,
                            &row.c_metadataxml,
                            &row.c_facttablecolumn,
                            &row.c_tablename,
                            &row.c_columnname,
                            &row.c_columndatatype,
                            &row.c_operator,
                            &row.c_dimcode,
                            &row.c_tooltip,
                            &row.m_applied_path,
                            &row.update_date,
                            &row.download_date,
                            &row.import_date,
                            &row.sourcesystem_cd,
                        ],
                    )
                    .await;

                match result {
                    Ok(_) => written += 1,
                    Err(e) => {
                        tracing::error!(
                            c_fullname = %row.c_fullname,
                            error = %e,
                            "Failed to insert metadata row"
                        );
                        self.write_failures += 1;
                    }
                }
            }
        }

        if !observations.is_empty() {
            let statement = connection
                .prepare(&observation_sql)
                .await
                .map_err(|e| OdmError::Database(format!("Failed to prepare insert: {e}")))?;

            for row in &observations {
                let result = connection
                    .execute(
                        &statement,
                        &[
                            &row.encounter_num,
                            &row.patient_num,
                            &row.concept_cd,
                            &row.provider_id,
                            &row.start_date,
                            &row.modifier_cd,
                            &row.instance_num,
                            &row.valtype_cd,
                            &row.tval_char,
                            &row.nval_num,
                            &row.update_date,
                            &row.download_date,
                            &row.import_date,
                            &row.sourcesystem_cd,
                        ],
                    )
                    .await;

                match result {
                    Ok(_) => written += 1,
                    Err(e) => {
                        tracing::error!(
                            patient_num = %row.patient_num,
                            concept_cd = %row.concept_cd,
                            error = %e,
                            "Failed to insert observation row"
                        );
                        self.write_failures += 1;
                    }
                }
            }
        }

        tracing::debug!(
            metadata = metadata.len(),
            observations = observations.len(),
            written,
            "Batch written"
        );
        Ok(())
    }

    /// Removes rows left by an earlier export of the study
    async fn delete_study(&self, scope: &StudyScope) -> Result<()> {
        let config = self.client.config();

        let metadata_deleted = self
            .client
            .execute(
                &format!(
                    "DELETE FROM {} WHERE c_fullname LIKE $1 ESCAPE '!'",
                    config.metadata_table
                ),
                &[&like_prefix(&scope.root_path())],
            )
            .await?;

        let facts_deleted = self
            .client
            .execute(
                &format!(
                    "DELETE FROM {} WHERE concept_cd LIKE $1 ESCAPE '!'",
                    config.fact_table
                ),
                &[&like_prefix(&study_code_prefix(&scope.study_oid))],
            )
            .await?;

        tracing::info!(
            study_oid = %scope.study_oid,
            metadata_deleted,
            facts_deleted,
            "Removed previous export of study"
        );
        Ok(())
    }
}

#[async_trait]
impl ExportSink for PostgreSQLSink {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    async fn begin_study(
        &mut self,
        scope: &StudyScope,
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(active) = &self.scope {
            return Err(OdmError::Protocol(format!(
                "study '{}' started before '{}' was flushed",
                scope.study_oid, active.study_oid
            )));
        }

        self.delete_study(scope).await?;
        self.activate(scope, started_at);
        Ok(())
    }

    async fn emit_concept(&mut self, row: &ConceptRow) -> Result<()> {
        let metadata = MetadataRow::from_concept(row, self.scope()?, self.loaded_at);
        self.insert_metadata(metadata).await
    }

    async fn emit_fact(&mut self, fact: &ObservationFact) -> Result<()> {
        let observation = ObservationRow::from_fact(fact, self.scope()?);
        self.insert_observation(observation).await
    }

    async fn flush(&mut self) -> Result<()> {
        if self.scope.take().is_none() {
            return Err(OdmError::Protocol(
                "flush without a started study".to_string(),
            ));
        }
        self.execute_batch().await
    }

    fn write_failures(&self) -> usize {
        self.write_failures
    }
}

fn metadata_insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (
            c_hlevel, c_fullname, c_name, c_synonym_cd, c_visualattributes,
            c_basecode, c_metadataxml, c_facttablecolumn, c_tablename, c_columnname,
            c_columndatatype, c_operator, c_dimcode, c_tooltip, m_applied_path,
            update_date, download_date, import_date, sourcesystem_cd
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)"
    )
}

fn observation_insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (
            encounter_num, patient_num, concept_cd, provider_id, start_date,
            modifier_cd, instance_num, valtype_cd, tval_char, nval_num,
            update_date, download_date, import_date, sourcesystem_cd
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::text::numeric, $11, $12, $13, $14)"
    )
}

/// `LIKE` pattern matching every value that starts with `prefix`, using `!`
/// as the escape character
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 2);
    for c in prefix.chars() {
        if matches!(c, '!' | '%' | '_') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
