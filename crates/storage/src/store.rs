// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed state store
//!
//! Layout under the store root:
//!
//! ```text
//! jobs/<job-id>/checkpoint.json
//! jobs/<job-id>/checkpoint.prev.json
//! jobs/<job-id>/intermediate.jsonl
//! jobs/<job-id>/output.jsonl
//! jobs/<job-id>/lock
//! jobs/<job-id>/cancel
//! ```
//!
//! `lock` carries an exclusive advisory lock while a writer runs a slice of
//! the job. `cancel` exists while a cancel request waits for that writer.

use crate::checkpoint::CheckpointFile;
use crate::spool::SpoolFile;
use crate::StorageError;
use async_trait::async_trait;
use fs2::FileExt;
use sj_core::{JobCheckpoint, JobId, SpoolEntry, StateStore, StoreError, Stream};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Cached end of a spool file
#[derive(Debug, Clone, Copy, Default)]
struct SpoolHead {
    len: u64,
    position: u64,
}

/// Exclusive lock on a job's `lock` file, released on drop
#[derive(Debug)]
pub struct JobLock {
    file: File,
    path: PathBuf,
}

impl Drop for JobLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release job lock");
        }
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// State store keeping each job in its own directory
#[derive(Clone)]
pub struct FileStateStore {
    root: PathBuf,
    heads: Arc<Mutex<HashMap<PathBuf, SpoolHead>>>,
}

impl FileStateStore {
    /// Open a store at the given directory, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(root.join("jobs"))?;
        Ok(Self {
            root,
            heads: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn job_dir(&self, job: &JobId) -> Result<PathBuf, StoreError> {
        let id = job.0.as_str();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("job id is not a valid directory name: {id:?}"),
            )));
        }
        Ok(self.root.join("jobs").join(id))
    }

    fn spool(&self, job: &JobId, stream: Stream) -> Result<SpoolFile, StoreError> {
        let name = format!("{}.jsonl", stream.name());
        Ok(SpoolFile::new(self.job_dir(job)?.join(name)))
    }

    fn checkpoint_file(&self, job: &JobId) -> Result<CheckpointFile, StoreError> {
        Ok(CheckpointFile::new(self.job_dir(job)?.join("checkpoint.json")))
    }

    fn cancel_marker(&self, job: &JobId) -> Result<PathBuf, StoreError> {
        Ok(self.job_dir(job)?.join("cancel"))
    }

    /// Ids of every job with a saved checkpoint, sorted
    pub fn job_ids(&self) -> Result<Vec<JobId>, StoreError> {
        let mut ids = vec![];
        for entry in std::fs::read_dir(self.root.join("jobs"))? {
            let entry = entry?;
            let dir = entry.path();
            let has_checkpoint =
                dir.join("checkpoint.json").exists() || dir.join("checkpoint.prev.json").exists();
            if has_checkpoint {
                ids.push(JobId(entry.file_name().to_string_lossy().into_owned()));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn cached_head(
    heads: &mut HashMap<PathBuf, SpoolHead>,
    spool: &SpoolFile,
) -> Result<SpoolHead, StorageError> {
    if let Some(head) = heads.get(spool.path()) {
        return Ok(*head);
    }
    let scan = spool.scan(0)?;
    if scan.torn {
        tracing::warn!(
            path = %spool.path().display(),
            valid_entries = scan.len,
            "spool has a torn tail; it will be cut on next append"
        );
    }
    let head = SpoolHead {
        len: scan.len,
        position: scan.last_valid_position,
    };
    heads.insert(spool.path().to_path_buf(), head);
    Ok(head)
}

#[async_trait]
impl StateStore for FileStateStore {
    type Lock = JobLock;

    fn try_lock(&self, job: &JobId) -> Result<Option<JobLock>, StoreError> {
        let dir = self.job_dir(job)?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if is_contended(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        // Another process may have appended since this handle last looked
        let mut heads = self.heads.lock().unwrap_or_else(|e| e.into_inner());
        heads.retain(|cached, _| !cached.starts_with(&dir));
        Ok(Some(JobLock { file, path }))
    }

    async fn request_cancel(&self, job: &JobId) -> Result<(), StoreError> {
        let marker = self.cancel_marker(job)?;
        if let Some(dir) = marker.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(marker, b"")?;
        Ok(())
    }

    async fn cancel_requested(&self, job: &JobId) -> Result<bool, StoreError> {
        Ok(self.cancel_marker(job)?.try_exists()?)
    }

    async fn append(
        &self,
        job: &JobId,
        stream: Stream,
        entries: &[SpoolEntry],
    ) -> Result<u64, StoreError> {
        let spool = self.spool(job, stream)?;
        let mut heads = self.heads.lock().unwrap_or_else(|e| e.into_inner());
        let head = cached_head(&mut heads, &spool)?;
        if entries.is_empty() {
            return Ok(head.len);
        }
        let position = spool.append_at(head.len, head.position, entries)?;
        let head = SpoolHead {
            len: head.len + entries.len() as u64,
            position,
        };
        heads.insert(spool.path().to_path_buf(), head);
        Ok(head.len)
    }

    async fn read_stream(
        &self,
        job: &JobId,
        stream: Stream,
        limit: u64,
    ) -> Result<Vec<SpoolEntry>, StoreError> {
        let spool = self.spool(job, stream)?;
        Ok(spool.scan(limit)?.entries)
    }

    async fn truncate(&self, job: &JobId, stream: Stream, len: u64) -> Result<(), StoreError> {
        let spool = self.spool(job, stream)?;
        let mut heads = self.heads.lock().unwrap_or_else(|e| e.into_inner());
        let scan = spool.scan(0)?;
        if scan.len < len {
            return Err(StoreError::Truncate {
                stream,
                len,
                available: scan.len,
            });
        }
        let position = match len {
            0 => 0,
            n => scan.positions[(n - 1) as usize],
        };
        if scan.torn || scan.last_valid_position != position {
            spool.truncate_to(position)?;
        }
        heads.insert(spool.path().to_path_buf(), SpoolHead { len, position });
        Ok(())
    }

    async fn discard(&self, job: &JobId) -> Result<(), StoreError> {
        let mut heads = self.heads.lock().unwrap_or_else(|e| e.into_inner());
        for stream in [Stream::Intermediate, Stream::Output] {
            let spool = self.spool(job, stream)?;
            spool.remove()?;
            heads.remove(spool.path());
        }
        match std::fs::remove_file(self.cancel_marker(job)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save_checkpoint(&self, checkpoint: &JobCheckpoint) -> Result<(), StoreError> {
        self.checkpoint_file(&checkpoint.job.id)?.save(checkpoint)?;
        Ok(())
    }

    async fn load_checkpoint(&self, job: &JobId) -> Result<Option<JobCheckpoint>, StoreError> {
        Ok(self.checkpoint_file(job)?.load()?)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
