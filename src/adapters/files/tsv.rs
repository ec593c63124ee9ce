//! Tab-separated output file with a one-time header
//!
//! Each file moves `HeaderPending → Writing → Closed`. The header must be
//! written before the first data row and is written exactly once.
//!
//! Fields are never quoted, so tabs and line breaks inside a field are
//! written as spaces to keep every record on one line.

use crate::domain::{OdmError, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    HeaderPending,
    Writing,
    Closed,
}

/// One tab-separated output file
pub struct TsvFile {
    path: PathBuf,
    writer: Option<Writer<File>>,
    state: FileState,
}

impl TsvFile {
    /// Creates (or truncates) the file at `path`
    ///
    /// # Errors
    ///
    /// Returns `OdmError::Io` if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .map_err(|e| OdmError::Io(format!("Failed to create '{}': {e}", path.display())))?;

        tracing::info!(path = %path.display(), "Opened export file");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            state: FileState::HeaderPending,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn is_header_pending(&self) -> bool {
        self.state == FileState::HeaderPending
    }

    /// Writes the header row and moves the file to `Writing`
    ///
    /// # Errors
    ///
    /// `OdmError::Protocol` if the header was already written or the file is
    /// closed; `OdmError::Io` if the write fails. The state advances even
    /// when the write fails so the header is never attempted twice.
    pub fn write_header<I, S>(&mut self, header: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        if self.state != FileState::HeaderPending {
            return Err(OdmError::Protocol(format!(
                "header of '{}' written twice",
                self.path.display()
            )));
        }
        self.state = FileState::Writing;
        self.write(header)
    }

    /// Writes one data row
    ///
    /// # Errors
    ///
    /// `OdmError::Protocol` unless the file is in `Writing`; `OdmError::Io`
    /// if the write fails.
    pub fn write_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        match self.state {
            FileState::Writing => self.write(row),
            FileState::HeaderPending => Err(OdmError::Protocol(format!(
                "data row written to '{}' before its header",
                self.path.display()
            ))),
            FileState::Closed => Err(OdmError::Protocol(format!(
                "'{}' is already closed",
                self.path.display()
            ))),
        }
    }

    /// Flushes and releases the file; closing twice is a no-op
    pub fn close(&mut self) -> Result<()> {
        self.state = FileState::Closed;
        match self.writer.take() {
            Some(mut writer) => writer
                .flush()
                .map_err(|e| OdmError::Io(format!("Failed to flush '{}': {e}", self.path.display()))),
            None => Ok(()),
        }
    }

    fn write<I, S>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let writer = self.writer.as_mut().ok_or_else(|| {
            OdmError::Protocol(format!("'{}' is already closed", self.path.display()))
        })?;
        let fields: Vec<S> = record.into_iter().collect();
        writer
            .write_record(fields.iter().map(|field| single_line(field.as_ref())))
            .map_err(|e| OdmError::Io(format!("Failed to write '{}': {e}", self.path.display())))
    }
}

fn is_break(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\r' | b'\n')
}

/// Replaces field and record separators with spaces
fn single_line(field: &[u8]) -> Cow<'_, [u8]> {
    if !field.iter().copied().any(is_break) {
        return Cow::Borrowed(field);
    }
    Cow::Owned(
        field
            .iter()
            .map(|&byte| if is_break(byte) { b' ' } else { byte })
            .collect(),
    )
}

impl std::fmt::Debug for TsvFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsvFile")
            .field("path", &self.path)
            .field("state", &self.state)
            .finish()
    }
}
