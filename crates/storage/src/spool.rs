// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only spool files
//!
//! Each line is one JSON [`SpoolLine`] carrying its position in the file and
//! a CRC32 of the entry. Reading stops at the first line that fails to
//! parse, fails its checksum, or is out of position, which is where a torn
//! append left off. Appends first cut the file back to the last valid line.

use crate::StorageError;
use serde::{Deserialize, Serialize};
use sj_core::SpoolEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One line of a spool file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolLine {
    /// 0-based position of the entry in the spool
    pub index: u64,
    pub entry: SpoolEntry,
    /// CRC32 of the serialized entry
    pub checksum: u32,
}

impl SpoolLine {
    pub fn new(index: u64, entry: SpoolEntry) -> Self {
        let checksum = Self::calculate_checksum(&entry);
        Self {
            index,
            entry,
            checksum,
        }
    }

    fn calculate_checksum(entry: &SpoolEntry) -> u32 {
        // SpoolEntry holds only strings and integers, so serialization cannot fail
        let json = serde_json::to_string(entry).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.entry)
    }

    pub fn to_line(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    pub fn from_line(line: &str) -> Result<Self, StorageError> {
        serde_json::from_str(line).map_err(StorageError::from)
    }
}

/// Result of scanning a spool file
#[derive(Debug, Default)]
pub struct SpoolScan {
    pub entries: Vec<SpoolEntry>,
    /// Number of valid entries in the file
    pub len: u64,
    /// Byte position after the last valid entry
    pub last_valid_position: u64,
    /// Byte position after each valid entry
    pub positions: Vec<u64>,
    /// Whether invalid bytes follow the last valid entry
    pub torn: bool,
}

/// A spool stored as a JSONL file
#[derive(Debug, Clone)]
pub struct SpoolFile {
    path: PathBuf,
}

impl SpoolFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read up to `limit` valid entries; a missing file is an empty spool
    pub fn scan(&self, limit: u64) -> Result<SpoolScan, StorageError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SpoolScan::default()),
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);
        let mut scan = SpoolScan::default();
        let mut position = 0u64;

        loop {
            let mut line = String::new();
            let bytes_read = match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(n) => n as u64,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    scan.torn = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            // A line without its newline was cut short mid-append
            if !line.ends_with('\n') {
                scan.torn = true;
                break;
            }
            let parsed = match SpoolLine::from_line(line.trim_end()) {
                Ok(parsed) if parsed.verify() && parsed.index == scan.len => parsed,
                Ok(parsed) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        index = parsed.index,
                        expected = scan.len,
                        "spool line failed validation"
                    );
                    scan.torn = true;
                    break;
                }
                Err(_) => {
                    scan.torn = true;
                    break;
                }
            };

            position += bytes_read;
            scan.last_valid_position = position;
            scan.len += 1;
            scan.positions.push(position);
            if scan.len <= limit {
                scan.entries.push(parsed.entry);
            }
        }
        Ok(scan)
    }

    /// Append entries after the first `len` valid ones, ending at byte `position`
    ///
    /// Anything past `position` is cut off first. Returns the byte position
    /// after the last appended line.
    pub fn append_at(
        &self,
        len: u64,
        position: u64,
        entries: &[SpoolEntry],
    ) -> Result<u64, StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;
        if file.metadata()?.len() != position {
            file.set_len(position)?;
        }

        let mut buf = String::new();
        for (i, entry) in entries.iter().enumerate() {
            let line = SpoolLine::new(len + i as u64, entry.clone());
            buf.push_str(&line.to_line()?);
            buf.push('\n');
        }
        file.seek(SeekFrom::Start(position))?;
        file.write_all(buf.as_bytes())?;
        file.sync_all()?;
        Ok(position + buf.len() as u64)
    }

    /// Cut the file back to `position` bytes
    pub fn truncate_to(&self, position: u64) -> Result<(), StorageError> {
        let file = match OpenOptions::new().write(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && position == 0 => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        file.set_len(position)?;
        file.sync_all()?;
        tracing::debug!(path = %self.path.display(), position, "spool truncated");
        Ok(())
    }

    pub fn remove(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "spool_tests.rs"]
mod tests;
