// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! sj-storage: file-backed collaborators for the job engine
//!
//! - Checksummed append-only spool files
//! - Atomic checkpoint files with fallback to the previous save
//! - [`FileStateStore`], a `StateStore` laid out one directory per job
//! - [`FileRecordSource`], a `RecordSource` over line-delimited files

mod checkpoint;
mod file_source;
mod spool;
mod store;

pub use checkpoint::CheckpointFile;
pub use file_source::FileRecordSource;
pub use spool::{SpoolFile, SpoolLine, SpoolScan};
pub use store::{FileStateStore, JobLock};

use sj_core::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from file storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => StoreError::Io(e),
            StorageError::Json(e) => StoreError::Serde(e),
            StorageError::Corrupt { path, reason } => StoreError::Corrupt {
                what: path.display().to_string(),
                reason,
            },
        }
    }
}
