// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory collaborator implementations for testing

use super::traits::*;
use crate::checkpoint::JobCheckpoint;
use crate::input::{Cursor, InputSource, Record, RecordBatch};
use crate::job::JobId;
use crate::shuffle::{SpoolEntry, Stream};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Page size used for file descriptors, which carry none of their own
const FILE_PAGE_SIZE: usize = 2;

// =============================================================================
// Record Source
// =============================================================================

#[derive(Default)]
struct SourceState {
    datasets: HashMap<String, Vec<Record>>,
    reads: Vec<Option<Cursor>>,
    fail_next: u32,
}

/// Record source serving datasets registered by locator
///
/// A descriptor's locator is its file path, search id, or query text.
#[derive(Clone, Default)]
pub struct MemoryRecordSource {
    state: Arc<Mutex<SourceState>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(self, locator: impl Into<String>, records: Vec<Record>) -> Self {
        self.insert(locator, records);
        self
    }

    pub fn insert(&self, locator: impl Into<String>, records: Vec<Record>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.datasets.insert(locator.into(), records);
    }

    /// Make the next `count` reads fail with a transient error
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).fail_next = count;
    }

    /// Cursors passed to every read so far, including failed ones
    pub fn reads(&self) -> Vec<Option<Cursor>> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reads
            .clone()
    }
}

fn locator(source: &InputSource) -> (String, usize) {
    match source {
        InputSource::File { path, .. } => (path_locator(path), FILE_PAGE_SIZE),
        InputSource::Search {
            search_id,
            page_size,
        } => (search_id.clone(), *page_size),
        InputSource::Query { query, page_size } => (query.clone(), *page_size),
    }
}

fn path_locator(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn read_batch(
        &self,
        source: &InputSource,
        cursor: Option<&Cursor>,
    ) -> Result<RecordBatch, SourceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.reads.push(cursor.cloned());
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(SourceError::Unavailable("injected failure".to_string()));
        }

        let (locator, page_size) = locator(source);
        let records = state
            .datasets
            .get(&locator)
            .ok_or_else(|| SourceError::NotFound(locator.clone()))?;

        let start = match cursor {
            None => 0,
            Some(Cursor(raw)) => raw
                .parse::<usize>()
                .map_err(|_| SourceError::InvalidCursor(raw.clone()))?,
        };
        let end = (start + page_size.max(1)).min(records.len());
        let page = records.get(start..end).unwrap_or_default().to_vec();
        let next = (end < records.len()).then(|| Cursor(end.to_string()));
        Ok(RecordBatch {
            records: page,
            next,
        })
    }
}

// =============================================================================
// State Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    spools: HashMap<(JobId, Stream), Vec<SpoolEntry>>,
    checkpoints: HashMap<JobId, JobCheckpoint>,
    saves: u64,
    fail_next: u32,
    unavailable: bool,
    locked: HashSet<JobId>,
    cancels: HashSet<JobId>,
}

impl StoreState {
    fn check(&mut self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Io(std::io::Error::other("store offline")));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

/// Writer lock on a job in a [`MemoryStateStore`]
pub struct MemoryLock {
    state: Arc<Mutex<StoreState>>,
    job: JobId,
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.locked.remove(&self.job);
    }
}

/// State store held entirely in memory
///
/// Clones share their contents, so two engines over clones of one store
/// behave like two processes over one directory.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` operations fail with a transient error
    pub fn fail_next(&self, count: u32) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).fail_next = count;
    }

    /// Make every operation fail with a permanent error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).unavailable = unavailable;
    }

    /// Number of checkpoints saved so far
    pub fn checkpoint_saves(&self) -> u64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).saves
    }

    /// Current spool length, including uncommitted entries
    pub fn spool_len(&self, job: &JobId, stream: Stream) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .spools
            .get(&(job.clone(), stream))
            .map_or(0, Vec::len)
    }

    /// Append entries directly, simulating work lost before a checkpoint
    pub fn inject(&self, job: &JobId, stream: Stream, entries: Vec<SpoolEntry>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .spools
            .entry((job.clone(), stream))
            .or_default()
            .extend(entries);
    }
}

// Locks and cancel requests bypass injected failures, which target spool
// and checkpoint traffic.
#[async_trait]
impl StateStore for MemoryStateStore {
    type Lock = MemoryLock;

    fn try_lock(&self, job: &JobId) -> Result<Option<MemoryLock>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.locked.insert(job.clone()) {
            return Ok(None);
        }
        Ok(Some(MemoryLock {
            state: Arc::clone(&self.state),
            job: job.clone(),
        }))
    }

    async fn request_cancel(&self, job: &JobId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.cancels.insert(job.clone());
        Ok(())
    }

    async fn cancel_requested(&self, job: &JobId) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.cancels.contains(job))
    }

    async fn append(
        &self,
        job: &JobId,
        stream: Stream,
        entries: &[SpoolEntry],
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        let spool = state.spools.entry((job.clone(), stream)).or_default();
        spool.extend_from_slice(entries);
        Ok(spool.len() as u64)
    }

    async fn read_stream(
        &self,
        job: &JobId,
        stream: Stream,
        limit: u64,
    ) -> Result<Vec<SpoolEntry>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        Ok(state
            .spools
            .get(&(job.clone(), stream))
            .map(|spool| spool.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn truncate(&self, job: &JobId, stream: Stream, len: u64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        let spool = state.spools.entry((job.clone(), stream)).or_default();
        if (spool.len() as u64) < len {
            return Err(StoreError::Truncate {
                stream,
                len,
                available: spool.len() as u64,
            });
        }
        spool.truncate(len as usize);
        Ok(())
    }

    async fn discard(&self, job: &JobId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        state.spools.remove(&(job.clone(), Stream::Intermediate));
        state.spools.remove(&(job.clone(), Stream::Output));
        state.cancels.remove(job);
        Ok(())
    }

    async fn save_checkpoint(&self, checkpoint: &JobCheckpoint) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        state
            .checkpoints
            .insert(checkpoint.job.id.clone(), checkpoint.clone());
        state.saves += 1;
        Ok(())
    }

    async fn load_checkpoint(&self, job: &JobId) -> Result<Option<JobCheckpoint>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.check()?;
        Ok(state.checkpoints.get(job).cloned())
    }
}

// =============================================================================
// Governance
// =============================================================================

/// Governance that totals every charge
#[derive(Clone, Default)]
pub struct FakeGovernance {
    total: Arc<AtomicU64>,
    calls: Arc<AtomicU64>,
}

impl FakeGovernance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Governance for FakeGovernance {
    fn charge_units(&self, units: u64) {
        self.total.fetch_add(units, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
