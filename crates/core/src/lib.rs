// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! sj-core: data model for staged, resumable map/reduce jobs
//!
//! This crate provides:
//! - The job stage machine and the effects it requests
//! - Work items, the execution budget, and the shuffle grouping
//! - Phase/job summaries, status reports, and checkpoints
//! - Collaborator traits (record source, state store, governance) with in-memory fakes
//! - User function traits and the definition registry

pub mod clock;
pub mod config;
pub mod id;
pub mod input;
pub mod traced;

pub mod adapters;

// State machines and data model (order matters for dependencies)
pub mod job;
pub mod effect;
pub mod work_item;
pub mod budget;
pub mod shuffle;
pub mod summary;
pub mod checkpoint;
pub mod status;

pub mod function;
pub mod registry;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BudgetPolicy, ConfigError, JobConfig, UsageCosts, MAX_CONCURRENCY};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use input::{Cursor, FileFormat, InputSource, Record, RecordBatch};
pub use traced::TracedEffect;

pub use budget::ExecutionBudget;
pub use checkpoint::{JobCheckpoint, SpoolWatermarks, StageState};
pub use effect::{Effect, Event};
pub use job::{Job, JobEvent, JobId, JobPlan, JobStatus, Stage, CANCELLED_REASON};
pub use shuffle::{group_by_key, KeyGroup, SpoolEntry, Stream};
pub use status::{StageCounts, StatusReport};
pub use summary::{
    JobSummary, KeyError, KeyOutcome, OutputPair, Phase, PhaseCounters, PhaseSummaries,
    PhaseSummary,
};
pub use work_item::{FailureDisposition, ItemState, WorkItem};

pub use function::{
    map_fn, reduce_fn, summarize_fn, Emitter, IdentityMapper, MapContext, Mapper, ReduceContext,
    Reducer, Summarizer,
};
pub use registry::{JobDefinition, JobRegistry};

// Re-export adapters
pub use adapters::{
    FakeGovernance, Governance, MemoryLock, MemoryRecordSource, MemoryStateStore, RecordSource,
    SourceError, StateStore, StoreError, TracingGovernance,
};
