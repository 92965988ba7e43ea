// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where new job ids come from
//!
//! A job id names the job's directory in the file store, so every generator
//! produces ids made of ASCII letters, digits and `-`. Ids also sort in the
//! order they were handed out, which keeps job listings in submission order.

use crate::job::JobId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hands out the id of each submitted job
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> JobId;
}

/// Time-ordered UUIDv7 ids, unique across processes sharing a store
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> JobId {
        JobId(uuid::Uuid::now_v7().simple().to_string())
    }
}

/// Digits a [`SequentialIdGen`] pads its counter to
const COUNTER_WIDTH: usize = 4;

/// Predictable `<prefix>-NNNN` ids; clones share one counter
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("job")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> JobId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        JobId(format!("{}-{n:0width$}", self.prefix, width = COUNTER_WIDTH))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
