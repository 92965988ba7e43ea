// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Record source over line-delimited files
//!
//! The cursor is `<byte offset>:<line number>` of the next unread line, so
//! each batch seeks straight to where the previous one stopped.

use async_trait::async_trait;
use sj_core::{Cursor, FileFormat, InputSource, Record, RecordBatch, RecordSource, SourceError};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Default number of lines per batch
pub const DEFAULT_BATCH_LINES: usize = 256;

/// Reads `file` input descriptors from the local filesystem
#[derive(Clone)]
pub struct FileRecordSource {
    /// Directory relative paths are resolved against
    base_dir: Option<PathBuf>,
    batch_lines: usize,
}

impl Default for FileRecordSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FileRecordSource {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            batch_lines: DEFAULT_BATCH_LINES,
        }
    }

    pub fn with_base_dir(self, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            ..self
        }
    }

    pub fn with_batch_lines(self, batch_lines: usize) -> Self {
        Self {
            batch_lines: batch_lines.max(1),
            ..self
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read_lines(
        &self,
        path: &Path,
        format: FileFormat,
        cursor: Option<&Cursor>,
    ) -> Result<RecordBatch, SourceError> {
        let (offset, mut line_no) = match cursor {
            None => (0, 0),
            Some(cursor) => parse_cursor(cursor)?,
        };

        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(e),
        })?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset))?;

        let mut records = Vec::new();
        let mut position = offset;
        let mut lines_read = 0;
        while lines_read < self.batch_lines {
            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            position += n as u64;
            lines_read += 1;

            let text = line.trim_end_matches(['\n', '\r']);
            if !text.trim().is_empty() {
                records.push(parse_record(text, format, path, line_no)?);
            }
            line_no += 1;
        }

        let next = (position < file_len).then(|| Cursor(format!("{position}:{line_no}")));
        Ok(RecordBatch { records, next })
    }
}

fn parse_cursor(cursor: &Cursor) -> Result<(u64, u64), SourceError> {
    let invalid = || SourceError::InvalidCursor(cursor.0.clone());
    let (offset, line) = cursor.0.split_once(':').ok_or_else(invalid)?;
    let offset = offset.parse().map_err(|_| invalid())?;
    let line = line.parse().map_err(|_| invalid())?;
    Ok((offset, line))
}

fn parse_record(
    text: &str,
    format: FileFormat,
    path: &Path,
    line_no: u64,
) -> Result<Record, SourceError> {
    match format {
        FileFormat::Lines => Ok(Record::new(line_no.to_string(), text)),
        FileFormat::KeyValue => match text.split_once('\t') {
            Some((key, value)) => Ok(Record::new(key, value)),
            None => Err(SourceError::Malformed {
                location: format!("{}:{}", path.display(), line_no + 1),
                reason: "expected key<TAB>value".to_string(),
            }),
        },
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn read_batch(
        &self,
        source: &InputSource,
        cursor: Option<&Cursor>,
    ) -> Result<RecordBatch, SourceError> {
        match source {
            InputSource::File { path, format } => {
                self.read_lines(&self.resolve(path), *format, cursor)
            }
            other => Err(SourceError::Unsupported(other.kind())),
        }
    }
}

#[cfg(test)]
#[path = "file_source_tests.rs"]
mod tests;
