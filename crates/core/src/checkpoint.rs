// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable job state persisted at every slice boundary
//!
//! A checkpoint is the single source of truth a resuming slice starts from.
//! Spooled pairs past the recorded watermarks were written after the last
//! checkpoint and are discarded on resume.

use crate::job::{Job, JobStatus, Stage};
use crate::shuffle::Stream;
use crate::summary::{
    JobSummary, KeyError, KeyOutcome, Phase, PhaseCounters, PhaseSummaries, PhaseSummary,
};
use crate::work_item::WorkItem;
use serde::{Deserialize, Serialize};

/// Current checkpoint format version
pub const CHECKPOINT_VERSION: u32 = 1;

/// Items, counters and errors for one of the MAP or REDUCE stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    pub items: Vec<WorkItem>,
    pub counters: PhaseCounters,
    pub errors: Vec<KeyError>,
}

impl StageState {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Items not yet COMPLETE or terminally FAILED
    pub fn pending(&self) -> usize {
        self.items.iter().filter(|i| !i.is_terminal()).count()
    }

    pub fn is_finished(&self) -> bool {
        self.items.iter().all(WorkItem::is_terminal)
    }

    /// Whether this stage was interrupted by a yield
    ///
    /// Every item still pending afterwards was pending when it yielded, so
    /// its next invocation is a restart.
    pub fn is_resumed(&self) -> bool {
        self.counters.yields > 0
    }

    /// Freeze this stage into an immutable summary
    pub fn summarize(&self, phase: Phase) -> PhaseSummary {
        let keys = self
            .items
            .iter()
            .map(|item| KeyOutcome {
                key: item.key.clone(),
                state: item.state,
                attempts: item.attempts,
            })
            .collect();
        PhaseSummary::new(phase, &self.counters, keys, self.errors.clone())
    }
}

/// Committed length of each spool stream, in entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolWatermarks {
    pub intermediate: u64,
    pub output: u64,
}

impl SpoolWatermarks {
    pub fn get(&self, stream: Stream) -> u64 {
        match stream {
            Stream::Intermediate => self.intermediate,
            Stream::Output => self.output,
        }
    }

    pub fn set(&mut self, stream: Stream, len: u64) {
        match stream {
            Stream::Intermediate => self.intermediate = len,
            Stream::Output => self.output = len,
        }
    }
}

/// Everything needed to resume a job from a slice boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCheckpoint {
    pub version: u32,
    /// Incremented on every save
    pub sequence: u64,
    pub job: Job,
    pub input: PhaseCounters,
    /// Number of records read during INPUT
    #[serde(default)]
    pub records: u64,
    pub map: StageState,
    pub reduce: StageState,
    pub watermarks: SpoolWatermarks,
    /// Usage overrun carried into the next slice
    #[serde(default)]
    pub carryover_units: u64,
    /// Frozen summary, present once the job is terminal
    #[serde(default)]
    pub summary: Option<JobSummary>,
}

impl JobCheckpoint {
    pub fn new(job: Job) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            sequence: 0,
            job,
            input: PhaseCounters::default(),
            records: 0,
            map: StageState::default(),
            reduce: StageState::default(),
            watermarks: SpoolWatermarks::default(),
            carryover_units: 0,
            summary: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.job.status()
    }

    /// Counters charged for the job's current stage
    ///
    /// SHUFFLE and SUMMARIZE have no summary of their own.
    pub fn counters_mut(&mut self) -> Option<&mut PhaseCounters> {
        match self.job.stage {
            Stage::Input => Some(&mut self.input),
            Stage::Map => Some(&mut self.map.counters),
            Stage::Reduce => Some(&mut self.reduce.counters),
            _ => None,
        }
    }

    /// Freeze the three phase summaries
    pub fn phase_summaries(&self) -> PhaseSummaries {
        PhaseSummaries {
            input: PhaseSummary::new(Phase::Input, &self.input, vec![], vec![]),
            map: self.map.summarize(Phase::Map),
            reduce: self.reduce.summarize(Phase::Reduce),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
