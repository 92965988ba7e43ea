// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase and job summaries
//!
//! [`PhaseCounters`] accumulate while a stage runs and are persisted with
//! every checkpoint. [`PhaseSummary`] and [`JobSummary`] are immutable
//! snapshots built from them once the job reaches a terminal stage; their
//! sequences can be iterated any number of times.

use crate::job::{JobId, JobStatus};
use crate::work_item::ItemState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stages that carry a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Input,
    Map,
    Reduce,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Input => "INPUT",
            Phase::Map => "MAP",
            Phase::Reduce => "REDUCE",
        };
        f.write_str(s)
    }
}

/// Running counters for one phase, accumulated across slices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounters {
    pub date_created: Option<DateTime<Utc>>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub usage: u64,
    /// Maximum number of items observed in flight at once
    pub concurrency: usize,
    pub yields: u32,
    /// Job-fatal error raised while this phase was running
    pub error: Option<String>,
}

impl PhaseCounters {
    /// Stamp the creation time the first time the phase runs
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.date_created.is_none() {
            self.date_created = Some(now);
        }
    }

    pub fn add_elapsed(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
    }

    pub fn add_usage(&mut self, units: u64) {
        self.usage = self.usage.saturating_add(units);
    }

    pub fn observe_concurrency(&mut self, in_flight: usize) {
        self.concurrency = self.concurrency.max(in_flight);
    }
}

/// Completion state of one key at the end of a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutcome {
    pub key: String,
    pub state: ItemState,
    pub attempts: u32,
}

/// One failed attempt of a user function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyError {
    pub key: String,
    pub error: String,
    /// 1-based attempt number that failed
    pub attempt: u32,
}

/// A final output pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPair {
    pub key: String,
    pub value: String,
}

impl OutputPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Immutable record of one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub date_created: Option<DateTime<Utc>>,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
    pub usage: u64,
    pub concurrency: usize,
    pub yields: u32,
    pub error: Option<String>,
    keys: Vec<KeyOutcome>,
    errors: Vec<KeyError>,
}

impl PhaseSummary {
    pub fn new(
        phase: Phase,
        counters: &PhaseCounters,
        keys: Vec<KeyOutcome>,
        errors: Vec<KeyError>,
    ) -> Self {
        Self {
            phase,
            date_created: counters.date_created,
            elapsed: counters.elapsed,
            usage: counters.usage,
            concurrency: counters.concurrency,
            yields: counters.yields,
            error: counters.error.clone(),
            keys,
            errors,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Per-key completion states, in item order
    pub fn keys(&self) -> impl Iterator<Item = &KeyOutcome> + '_ {
        self.keys.iter()
    }

    /// Every failed attempt, in the order they happened
    pub fn errors(&self) -> impl Iterator<Item = &KeyError> + '_ {
        self.errors.iter()
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys
            .iter()
            .filter(|k| k.state == ItemState::Failed)
            .map(|k| k.key.as_str())
    }
}

/// Immutable report of a finished job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub date_created: DateTime<Utc>,
    pub input: PhaseSummary,
    pub map: PhaseSummary,
    pub reduce: PhaseSummary,
    /// Total number of yields across all phases
    pub yields: u32,
    pub slices: u32,
    /// Error returned by the summarize hook, if any
    pub summarize_error: Option<String>,
    output: Vec<OutputPair>,
}

/// Phase summaries that make up a [`JobSummary`]
#[derive(Debug, Clone)]
pub struct PhaseSummaries {
    pub input: PhaseSummary,
    pub map: PhaseSummary,
    pub reduce: PhaseSummary,
}

impl JobSummary {
    pub fn new(
        job_id: JobId,
        status: JobStatus,
        date_created: DateTime<Utc>,
        phases: PhaseSummaries,
        output: Vec<OutputPair>,
    ) -> Self {
        let yields = phases.input.yields + phases.map.yields + phases.reduce.yields;
        Self {
            job_id,
            status,
            date_created,
            input: phases.input,
            map: phases.map,
            reduce: phases.reduce,
            yields,
            slices: 0,
            summarize_error: None,
            output,
        }
    }

    pub fn with_slices(self, slices: u32) -> Self {
        Self { slices, ..self }
    }

    pub fn with_summarize_error(self, summarize_error: Option<String>) -> Self {
        Self {
            summarize_error,
            ..self
        }
    }

    /// Final output pairs from REDUCE, or from MAP when reduce is skipped
    pub fn output(&self) -> impl Iterator<Item = &OutputPair> + '_ {
        self.output.iter()
    }

    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    /// The job-fatal error, from whichever phase recorded it
    pub fn error(&self) -> Option<&str> {
        [&self.input, &self.map, &self.reduce]
            .into_iter()
            .find_map(|p| p.error.as_deref())
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
