// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator interfaces and their in-memory implementations

pub mod fake;
pub mod traits;

pub use traits::{
    Governance, RecordSource, SourceError, StateStore, StoreError, TracingGovernance,
};

pub use fake::{FakeGovernance, MemoryLock, MemoryRecordSource, MemoryStateStore};
