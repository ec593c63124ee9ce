//! Correlated four-file writer
//!
//! Writes the tranSMART upload files of one study in a single pass:
//!
//! - concept map: `tranSMART_path`, `EDC_path`, `Control Vocab Cd`
//! - columns: one row per clinical data column
//! - word map: dictionary codes of categorical values
//! - clinical data: one wide row per subject, written on [`flush`]
//!
//! The files describe the same column set, so calls must arrive in order: a
//! column is registered before its categorical values, and those before any
//! fact that should be dictionary encoded. [`register_column`] hands out a
//! [`ColumnHandle`] that is the only way to register categorical values, and
//! a stale handle is rejected with `OdmError::Protocol`.
//!
//! Single-row I/O failures are logged and counted; the pass continues.
//!
//! [`flush`]: CorrelatedFileWriter::flush
//! [`register_column`]: CorrelatedFileWriter::register_column

use super::tsv::TsvFile;
use crate::domain::{ConceptCode, OdmError, Result, SubjectKey};
use std::collections::HashMap;
use std::path::Path;

/// Data label of the bootstrap subject column
pub const SUBJECT_COLUMN_LABEL: &str = "SUBJ_ID";

const CONCEPT_MAP_HEADER: [&str; 3] = ["tranSMART_path", "EDC_path", "Control Vocab Cd"];
const COLUMNS_HEADER: [&str; 6] = [
    "Filename",
    "Category Code",
    "Column Number",
    "Data Label",
    "Data Label Source",
    "Control Vocab Cd",
];
const WORD_MAP_HEADER: [&str; 4] = [
    "Filename",
    "Column Number",
    "Original Data Value",
    "New Data Values",
];

/// File names of the four outputs of a study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFileNames {
    pub concept_map: String,
    pub columns: String,
    pub word_map: String,
    pub clinical_data: String,
}

impl ExportFileNames {
    pub fn for_study(prefix: &str) -> Self {
        Self {
            concept_map: format!("{prefix}_concept_map.txt"),
            columns: format!("{prefix}_columns.txt"),
            word_map: format!("{prefix}_word_map.txt"),
            clinical_data: format!("{prefix}_clinical_data.txt"),
        }
    }
}

/// Proof that a column was registered; required to add its categorical
/// values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHandle {
    number: u32,
    code: ConceptCode,
}

impl ColumnHandle {
    /// Position in the clinical data file, 1-based (1 is the subject)
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn code(&self) -> &ConceptCode {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ColumnKey {
    Subject,
    Concept(ConceptCode),
}

/// Counters shared by the columns and word map files
#[derive(Debug)]
struct ColumnState {
    /// Column 1 is reserved for the subject identifier
    column_number: u32,
    current: Option<ConceptCode>,
    value_counter: u32,
    column_just_changed: bool,
}

impl Default for ColumnState {
    fn default() -> Self {
        Self {
            column_number: 1,
            current: None,
            value_counter: 1,
            column_just_changed: false,
        }
    }
}

pub struct CorrelatedFileWriter {
    names: ExportFileNames,
    prefix: String,
    concept_map: TsvFile,
    columns: TsvFile,
    word_map: TsvFile,
    clinical_data: TsvFile,
    state: ColumnState,
    column_headers: Vec<String>,
    column_keys: Vec<ColumnKey>,
    /// (column, raw value) → dictionary code
    dictionary: HashMap<ConceptCode, HashMap<String, u32>>,
    subjects: Vec<SubjectKey>,
    rows: HashMap<SubjectKey, HashMap<ColumnKey, String>>,
    write_failures: usize,
    flushed: bool,
}

impl CorrelatedFileWriter {
    /// Opens the four files of a study inside `dir`
    ///
    /// `prefix` is the normalized study name used for file names and column
    /// headers.
    ///
    /// # Errors
    ///
    /// Returns `OdmError::Io` if any file cannot be created.
    pub fn create(dir: &Path, prefix: &str) -> Result<Self> {
        let names = ExportFileNames::for_study(prefix);

        Ok(Self {
            concept_map: TsvFile::create(&dir.join(&names.concept_map))?,
            columns: TsvFile::create(&dir.join(&names.columns))?,
            word_map: TsvFile::create(&dir.join(&names.word_map))?,
            clinical_data: TsvFile::create(&dir.join(&names.clinical_data))?,
            names,
            prefix: prefix.to_string(),
            state: ColumnState::default(),
            column_headers: vec![format!("{prefix}_{SUBJECT_COLUMN_LABEL}")],
            column_keys: vec![ColumnKey::Subject],
            dictionary: HashMap::new(),
            subjects: Vec::new(),
            rows: HashMap::new(),
            write_failures: 0,
            flushed: false,
        })
    }

    pub fn file_names(&self) -> &ExportFileNames {
        &self.names
    }

    /// Clinical data column headers in registration order
    pub fn column_headers(&self) -> &[String] {
        &self.column_headers
    }

    pub fn write_failures(&self) -> usize {
        self.write_failures
    }

    /// Writes a concept map row mapping `{name_path}+{leaf_name}` to itself
    pub fn emit_concept_row(&mut self, name_path: &str, leaf_name: &str) -> Result<()> {
        self.ensure_open()?;

        if self.concept_map.is_header_pending() {
            let result = self.concept_map.write_header(CONCEPT_MAP_HEADER);
            self.absorb(result)?;
        }

        let path = format!("{name_path}+{leaf_name}");
        let result = self.concept_map.write_row([path.as_str(), path.as_str(), ""]);
        self.absorb(result)
    }

    /// Registers the next clinical data column
    ///
    /// The first call also writes the columns header and the bootstrap row
    /// of the subject column.
    pub fn register_column(
        &mut self,
        name_path: &str,
        leaf_name: &str,
        code: ConceptCode,
    ) -> Result<ColumnHandle> {
        self.ensure_open()?;

        if self.columns.is_header_pending() {
            let result = self.columns.write_header(COLUMNS_HEADER);
            self.absorb(result)?;
            let result = self.columns.write_row([
                self.names.clinical_data.as_str(),
                "",
                "1",
                SUBJECT_COLUMN_LABEL,
                "",
                "",
            ]);
            self.absorb(result)?;
        }

        self.state.column_number += 1;
        self.state.column_just_changed = true;
        self.state.current = Some(code.clone());

        let number = self.state.column_number.to_string();
        let result = self.columns.write_row([
            self.names.clinical_data.as_str(),
            name_path,
            number.as_str(),
            leaf_name,
            "",
            "",
        ]);
        self.absorb(result)?;

        self.column_headers.push(format!("{}_{leaf_name}", self.prefix));
        self.column_keys.push(ColumnKey::Concept(code.clone()));

        tracing::debug!(
            column_number = self.state.column_number,
            concept_code = %code,
            label = leaf_name,
            "Registered column"
        );

        Ok(ColumnHandle {
            number: self.state.column_number,
            code,
        })
    }

    /// Adds a categorical value to the column of `column`
    ///
    /// The first value after a column registration gets code 1, each further
    /// distinct value the next code. A value already in the dictionary keeps
    /// its code and writes no row.
    ///
    /// # Errors
    ///
    /// `OdmError::Protocol` if `column` is not the most recently registered
    /// column.
    pub fn register_categorical_value(
        &mut self,
        column: &ColumnHandle,
        raw_value: &str,
    ) -> Result<u32> {
        self.ensure_open()?;

        if self.state.column_number != column.number
            || self.state.current.as_ref() != Some(&column.code)
        {
            return Err(OdmError::Protocol(format!(
                "categorical value '{raw_value}' for column {} arrived after column {} was registered",
                column.number, self.state.column_number
            )));
        }

        if let Some(code) = self
            .dictionary
            .get(&column.code)
            .and_then(|values| values.get(raw_value))
        {
            tracing::debug!(
                column_number = column.number,
                value = raw_value,
                "Duplicate categorical value keeps its first code"
            );
            return Ok(*code);
        }

        if self.word_map.is_header_pending() {
            let result = self.word_map.write_header(WORD_MAP_HEADER);
            self.absorb(result)?;
        }

        if self.state.column_just_changed {
            self.state.value_counter = 1;
            self.state.column_just_changed = false;
        } else {
            self.state.value_counter += 1;
        }
        let code = self.state.value_counter;

        self.dictionary
            .entry(column.code.clone())
            .or_default()
            .insert(raw_value.to_string(), code);

        let number = column.number.to_string();
        let code_text = code.to_string();
        let result = self.word_map.write_row([
            self.names.clinical_data.as_str(),
            number.as_str(),
            code_text.as_str(),
            raw_value,
        ]);
        self.absorb(result)?;

        Ok(code)
    }

    /// Buffers one cell of the clinical data table
    ///
    /// Categorical values are stored as their dictionary code, everything
    /// else verbatim. Nothing is written until [`flush`](Self::flush).
    pub fn emit_fact(
        &mut self,
        column: &ConceptCode,
        raw_value: &str,
        subject: &SubjectKey,
    ) -> Result<()> {
        self.ensure_open()?;

        if !self.rows.contains_key(subject) {
            self.subjects.push(subject.clone());
            let mut row = HashMap::new();
            row.insert(ColumnKey::Subject, subject.as_str().to_string());
            self.rows.insert(subject.clone(), row);
        }

        let cell = self
            .dictionary
            .get(column)
            .and_then(|values| values.get(raw_value))
            .map(|code| code.to_string())
            .unwrap_or_else(|| raw_value.to_string());

        if let Some(row) = self.rows.get_mut(subject) {
            row.insert(ColumnKey::Concept(column.clone()), cell);
        }
        Ok(())
    }

    /// Writes the clinical data file and closes all four files
    ///
    /// Every file is closed even if writing the clinical data fails; the
    /// first failure is returned afterwards.
    ///
    /// # Errors
    ///
    /// `OdmError::Io` for the first write or close failure,
    /// `OdmError::Protocol` if the writer was already flushed.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flushed = true;

        let mut first_error = self.write_clinical_data().err();

        for file in [
            &mut self.concept_map,
            &mut self.columns,
            &mut self.word_map,
            &mut self.clinical_data,
        ] {
            if let Err(e) = file.close() {
                tracing::error!(path = %file.path().display(), error = %e, "Failed to close export file");
                first_error.get_or_insert(e);
            }
        }

        tracing::info!(
            file = %self.names.clinical_data,
            subjects = self.subjects.len(),
            columns = self.column_keys.len(),
            "Wrote clinical data"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_clinical_data(&mut self) -> Result<()> {
        self.clinical_data.write_header(&self.column_headers)?;

        for subject in &self.subjects {
            let Some(cells) = self.rows.get(subject) else {
                continue;
            };
            let row = self
                .column_keys
                .iter()
                .map(|key| cells.get(key).map(String::as_str).unwrap_or(""));
            self.clinical_data.write_row(row)?;
        }

        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.flushed {
            return Err(OdmError::Protocol(format!(
                "files of '{}' were already flushed",
                self.prefix
            )));
        }
        Ok(())
    }

    /// Logs and counts I/O failures; anything else propagates
    fn absorb(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Err(OdmError::Io(message)) => {
                tracing::error!(error = %message, "Export file write failed; continuing");
                self.write_failures += 1;
                Ok(())
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for CorrelatedFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelatedFileWriter")
            .field("names", &self.names)
            .field("state", &self.state)
            .field("columns", &self.column_keys.len())
            .field("subjects", &self.subjects.len())
            .field("write_failures", &self.write_failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn code(s: &str) -> ConceptCode {
        ConceptCode::new(s).unwrap()
    }

    fn subject(s: &str) -> SubjectKey {
        SubjectKey::new(s).unwrap()
    }

    fn read(dir: &TempDir, name: &str) -> String {
        std::fs::read_to_string(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_header_follows_registration_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();
        writer.register_column("Visit+Form", "AGE", code("c-age")).unwrap();
        writer.register_column("Visit+Form", "SEX", code("c-sex")).unwrap();
        writer.flush().unwrap();

        let data = read(&dir, "STUDY_clinical_data.txt");
        assert_eq!(data, "STUDY_SUBJ_ID\tSTUDY_AGE\tSTUDY_SEX\n");
    }

    #[test]
    fn test_missing_cell_is_empty_field() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();
        writer.register_column("Visit+Form", "AGE", code("c-age")).unwrap();
        writer.register_column("Visit+Form", "SEX", code("c-sex")).unwrap();
        writer.emit_fact(&code("c-age"), "34", &subject("A")).unwrap();
        writer.emit_fact(&code("c-sex"), "F", &subject("B")).unwrap();
        writer.flush().unwrap();

        let data = read(&dir, "STUDY_clinical_data.txt");
        let lines: Vec<&str> = data.lines().collect();
        assert_eq!(lines[1], "A\t34\t");
        assert_eq!(lines[2], "B\t\tF");
    }

    #[test]
    fn test_categorical_codes_reset_per_column() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();

        let sex = writer.register_column("V+F", "SEX", code("c-sex")).unwrap();
        assert_eq!(writer.register_categorical_value(&sex, "Male").unwrap(), 1);
        assert_eq!(writer.register_categorical_value(&sex, "Female").unwrap(), 2);

        let arm = writer.register_column("V+F", "ARM", code("c-arm")).unwrap();
        assert_eq!(writer.register_categorical_value(&arm, "A").unwrap(), 1);
        writer.flush().unwrap();

        let word_map = read(&dir, "STUDY_word_map.txt");
        assert_eq!(
            word_map,
            "Filename\tColumn Number\tOriginal Data Value\tNew Data Values\n\
             STUDY_clinical_data.txt\t2\t1\tMale\n\
             STUDY_clinical_data.txt\t2\t2\tFemale\n\
             STUDY_clinical_data.txt\t3\t1\tA\n"
        );
    }

    #[test]
    fn test_columns_file_bootstrap_row() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();
        writer.register_column("Visit+Form", "AGE", code("c-age")).unwrap();
        writer.flush().unwrap();

        let columns = read(&dir, "STUDY_columns.txt");
        assert_eq!(
            columns,
            "Filename\tCategory Code\tColumn Number\tData Label\tData Label Source\tControl Vocab Cd\n\
             STUDY_clinical_data.txt\t\t1\tSUBJ_ID\t\t\n\
             STUDY_clinical_data.txt\tVisit+Form\t2\tAGE\t\t\n"
        );
    }

    #[test]
    fn test_concept_map_rows() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();
        writer.emit_concept_row("Visit+Form", "AGE").unwrap();
        writer.flush().unwrap();

        let concept_map = read(&dir, "STUDY_concept_map.txt");
        assert_eq!(
            concept_map,
            "tranSMART_path\tEDC_path\tControl Vocab Cd\nVisit+Form+AGE\tVisit+Form+AGE\t\n"
        );
    }

    #[test]
    fn test_facts_are_dictionary_encoded() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "STUDY").unwrap();
        let sex = writer.register_column("V+F", "SEX", code("c-sex")).unwrap();
        writer.register_categorical_value(&sex, "M").unwrap();
        writer.register_categorical_value(&sex, "F").unwrap();
        writer.emit_fact(&code("c-sex"), "F", &subject("A")).unwrap();
        writer.emit_fact(&code("c-sex"), "M", &subject("B")).unwrap();
        writer.flush().unwrap();

        let data = read(&dir, "STUDY_clinical_data.txt");
        assert_eq!(data, "STUDY_SUBJ_ID\tSTUDY_SEX\nA\t2\nB\t1\n");
    }

    #[test]
    fn test_dictionary_is_scoped_by_column() {
        // Identifiers sharing a prefix must not collide with a longer value
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        let first = writer.register_column("V+F", "X", code("col")).unwrap();
        writer.register_categorical_value(&first, "1A").unwrap();
        writer.register_column("V+F", "Y", code("col1")).unwrap();
        writer.emit_fact(&code("col1"), "A", &subject("P")).unwrap();
        writer.flush().unwrap();

        let data = read(&dir, "S_clinical_data.txt");
        assert_eq!(data.lines().nth(1), Some("P\t\tA"));
    }

    #[test]
    fn test_duplicate_categorical_value_keeps_code() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        let column = writer.register_column("V+F", "X", code("c")).unwrap();
        assert_eq!(writer.register_categorical_value(&column, "a").unwrap(), 1);
        assert_eq!(writer.register_categorical_value(&column, "a").unwrap(), 1);
        assert_eq!(writer.register_categorical_value(&column, "b").unwrap(), 2);
        writer.flush().unwrap();

        assert_eq!(read(&dir, "S_word_map.txt").lines().count(), 3);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        let old = writer.register_column("V+F", "X", code("x")).unwrap();
        writer.register_column("V+F", "Y", code("y")).unwrap();

        let err = writer.register_categorical_value(&old, "a").unwrap_err();
        assert!(matches!(err, OdmError::Protocol(_)));
    }

    #[test]
    fn test_subjects_in_first_seen_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        writer.register_column("V+F", "X", code("x")).unwrap();
        for key in ["Z", "A", "M", "A"] {
            writer.emit_fact(&code("x"), key, &subject(key)).unwrap();
        }
        writer.flush().unwrap();

        let data = read(&dir, "S_clinical_data.txt");
        let subjects: Vec<&str> = data
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(subjects, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_use_after_flush_is_protocol_error() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        writer.flush().unwrap();
        assert!(matches!(
            writer.emit_fact(&code("x"), "1", &subject("A")).unwrap_err(),
            OdmError::Protocol(_)
        ));
        assert!(matches!(writer.flush().unwrap_err(), OdmError::Protocol(_)));
    }

    #[test]
    fn test_free_text_with_separators_keeps_columns() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        writer.register_column("Visit+Form", "NOTE", code("c-note")).unwrap();
        writer.register_column("Visit+Form", "AGE", code("c-age")).unwrap();
        writer
            .emit_fact(&code("c-note"), "left\tright\nnext", &subject("A"))
            .unwrap();
        writer.emit_fact(&code("c-age"), "34", &subject("A")).unwrap();
        writer.flush().unwrap();

        assert_eq!(
            read(&dir, "S_clinical_data.txt"),
            "S_SUBJ_ID\tS_NOTE\tS_AGE\nA\tleft right next\t34\n"
        );
    }

    #[test]
    fn test_categorical_value_with_separators_stays_on_one_row() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();
        let column = writer.register_column("Visit+Form", "SITE", code("c-site")).unwrap();
        writer.register_categorical_value(&column, "North\nWing").unwrap();
        writer.emit_fact(&code("c-site"), "North\nWing", &subject("A")).unwrap();
        writer.flush().unwrap();

        assert_eq!(
            read(&dir, "S_word_map.txt"),
            "Filename\tColumn Number\tOriginal Data Value\tNew Data Values\n\
             S_clinical_data.txt\t2\t1\tNorth Wing\n"
        );
        assert_eq!(
            read(&dir, "S_clinical_data.txt"),
            "S_SUBJ_ID\tS_SITE\nA\t1\n"
        );
    }

    #[test]
    fn test_io_failures_are_counted_not_raised() {
        let dir = TempDir::new().unwrap();
        let mut writer = CorrelatedFileWriter::create(dir.path(), "S").unwrap();

        writer
            .absorb(Err(OdmError::Io("disk full".to_string())))
            .unwrap();
        assert_eq!(writer.write_failures(), 1);

        let err = writer
            .absorb(Err(OdmError::Protocol("misuse".to_string())))
            .unwrap_err();
        assert!(matches!(err, OdmError::Protocol(_)));
        assert_eq!(writer.write_failures(), 1);
    }

    #[test]
    fn test_file_names_use_prefix() {
        let names = ExportFileNames::for_study("Demo_Study");
        assert_eq!(names.concept_map, "Demo_Study_concept_map.txt");
        assert_eq!(names.columns, "Demo_Study_columns.txt");
        assert_eq!(names.word_map, "Demo_Study_word_map.txt");
        assert_eq!(names.clinical_data, "Demo_Study_clinical_data.txt");
    }
}
