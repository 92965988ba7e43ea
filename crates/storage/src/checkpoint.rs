// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic checkpoint files
//!
//! A save writes a temporary file, syncs it, moves the current checkpoint
//! aside as `.prev`, and renames the temporary file into place. A reader
//! therefore sees either the old or the new checkpoint, never a mix; if the
//! current file is missing or fails its checksum the previous one is used.

use crate::StorageError;
use serde::{Deserialize, Serialize};
use sj_core::JobCheckpoint;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// On-disk wrapper holding the serialized checkpoint and its CRC32
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    checksum: u32,
    body: String,
}

/// The current and previous checkpoint files of one job
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    pub fn prev_path(&self) -> PathBuf {
        self.sibling(".prev.json")
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    pub fn save(&self, checkpoint: &JobCheckpoint) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(checkpoint)?;
        let envelope = Envelope {
            checksum: crc32fast::hash(body.as_bytes()),
            body,
        };

        let tmp = self.tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(serde_json::to_string(&envelope)?.as_bytes())?;
            file.sync_all()?;
        }
        if self.path.exists() {
            fs::rename(&self.path, self.prev_path())?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_dir(self.path.parent())?;
        Ok(())
    }

    /// Load the newest intact checkpoint, if any was ever saved
    pub fn load(&self) -> Result<Option<JobCheckpoint>, StorageError> {
        let current_err = match read_checkpoint(&self.path) {
            Ok(Some(checkpoint)) => return Ok(Some(checkpoint)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "checkpoint unreadable, falling back to previous"
                );
                Some(e)
            }
        };
        match (read_checkpoint(&self.prev_path())?, current_err) {
            (Some(checkpoint), _) => Ok(Some(checkpoint)),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(None),
        }
    }

    pub fn remove(&self) -> Result<(), StorageError> {
        for path in [self.path.clone(), self.prev_path(), self.tmp_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn read_checkpoint(path: &Path) -> Result<Option<JobCheckpoint>, StorageError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let envelope: Envelope = serde_json::from_str(&text)?;
    if crc32fast::hash(envelope.body.as_bytes()) != envelope.checksum {
        return Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: "checksum mismatch".to_string(),
        });
    }
    let checkpoint: JobCheckpoint = serde_json::from_str(&envelope.body)?;
    if checkpoint.version != sj_core::checkpoint::CHECKPOINT_VERSION {
        return Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("unsupported version: {}", checkpoint.version),
        });
    }
    Ok(Some(checkpoint))
}

#[cfg(unix)]
fn sync_dir(dir: Option<&Path>) -> Result<(), StorageError> {
    if let Some(dir) = dir {
        File::open(dir)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: Option<&Path>) -> Result<(), StorageError> {
    Ok(())
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
