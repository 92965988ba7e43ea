// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator interfaces the engine consumes but does not implement

use crate::checkpoint::JobCheckpoint;
use crate::input::{Cursor, InputSource, RecordBatch};
use crate::job::JobId;
use crate::shuffle::{sort_entries, SpoolEntry, Stream};
use async_trait::async_trait;
use std::io::ErrorKind;
use thiserror::Error;

fn is_transient_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
    )
}

// =============================================================================
// Record Source
// =============================================================================

/// Errors from reading input records
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("input not found: {0}")]
    NotFound(String),
    #[error("{0} input is not supported by this source")]
    Unsupported(&'static str),
    #[error("malformed record at {location}: {reason}")]
    Malformed { location: String, reason: String },
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("source temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether retrying the same read may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Unavailable(_) => true,
            SourceError::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

/// Paged access to the records named by an input descriptor
#[async_trait]
pub trait RecordSource: Clone + Send + Sync + 'static {
    /// Read the page at `cursor` (the first page when `None`)
    ///
    /// Reads are deterministic: the same descriptor and cursor return the
    /// same records.
    async fn read_batch(
        &self,
        source: &InputSource,
        cursor: Option<&Cursor>,
    ) -> Result<RecordBatch, SourceError>;
}

// =============================================================================
// State Store
// =============================================================================

/// Errors from the durable spool and checkpoint store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt {what}: {reason}")]
    Corrupt { what: String, reason: String },
    #[error("cannot truncate {stream} spool to {len}: only {available} entries")]
    Truncate {
        stream: Stream,
        len: u64,
        available: u64,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

/// Durable per-job spools and checkpoints
///
/// Spool lengths are counted in entries. A spool is append-only except for
/// `truncate`, which rolls back uncommitted appends on resume.
///
/// Every handle on the same storage shares one writer lock per job, so two
/// processes never run a slice of the same job at once.
#[async_trait]
pub trait StateStore: Clone + Send + Sync + 'static {
    /// Exclusive writer lock on one job, released on drop
    type Lock: Send + 'static;

    /// Take the job's writer lock, or `None` while another writer holds it
    fn try_lock(&self, job: &JobId) -> Result<Option<Self::Lock>, StoreError>;

    /// Leave a cancel request for whichever writer holds the job
    async fn request_cancel(&self, job: &JobId) -> Result<(), StoreError>;

    /// Whether a cancel request is waiting for the job
    async fn cancel_requested(&self, job: &JobId) -> Result<bool, StoreError>;

    /// Append entries in order, returning the new spool length
    async fn append(
        &self,
        job: &JobId,
        stream: Stream,
        entries: &[SpoolEntry],
    ) -> Result<u64, StoreError>;

    /// Read the first `limit` entries of a spool, in append order
    async fn read_stream(
        &self,
        job: &JobId,
        stream: Stream,
        limit: u64,
    ) -> Result<Vec<SpoolEntry>, StoreError>;

    /// All values written under `key`, in write order
    async fn read_group(
        &self,
        job: &JobId,
        stream: Stream,
        limit: u64,
        key: &str,
    ) -> Result<Vec<String>, StoreError> {
        let mut entries: Vec<SpoolEntry> = self
            .read_stream(job, stream, limit)
            .await?
            .into_iter()
            .filter(|e| e.key == key)
            .collect();
        sort_entries(&mut entries);
        Ok(entries.into_iter().map(|e| e.value).collect())
    }

    /// Drop every entry past `len`
    async fn truncate(&self, job: &JobId, stream: Stream, len: u64) -> Result<(), StoreError>;

    /// Remove both spools of a job and any waiting cancel request
    async fn discard(&self, job: &JobId) -> Result<(), StoreError>;

    /// Atomically replace the job's checkpoint
    async fn save_checkpoint(&self, checkpoint: &JobCheckpoint) -> Result<(), StoreError>;

    async fn load_checkpoint(&self, job: &JobId) -> Result<Option<JobCheckpoint>, StoreError>;
}

// =============================================================================
// Governance
// =============================================================================

/// External quota accounting for usage units
pub trait Governance: Clone + Send + Sync + 'static {
    fn charge_units(&self, units: u64);
}

/// Governance that reports charges to the trace log
#[derive(Clone, Default)]
pub struct TracingGovernance;

impl Governance for TracingGovernance {
    fn charge_units(&self, units: u64) {
        tracing::trace!(units, "usage charged");
    }
}
