// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine
//!
//! A job moves through `Input → Map → Shuffle → Reduce → Summarize → Done`,
//! skipping the stages its definition does not supply functions for. Any
//! stage may end in `Failed` on a job-fatal error.

use crate::clock::Clock;
use crate::config::JobConfig;
use crate::effect::{Effect, Event};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

/// The stage a job is in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Input,
    Map,
    Shuffle,
    Reduce,
    Summarize,
    Done,
    Failed { reason: String },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Input => "INPUT",
            Stage::Map => "MAP",
            Stage::Shuffle => "SHUFFLE",
            Stage::Reduce => "REDUCE",
            Stage::Summarize => "SUMMARIZE",
            Stage::Done => "DONE",
            Stage::Failed { .. } => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed { .. })
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-facing job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Complete,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Which optional stages a job runs, fixed at submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPlan {
    pub map: bool,
    pub reduce: bool,
}

impl JobPlan {
    /// The stage that follows `stage` under this plan
    pub fn next_stage(&self, stage: &Stage) -> Stage {
        match stage {
            Stage::Input if self.map => Stage::Map,
            Stage::Input | Stage::Map if self.reduce => Stage::Shuffle,
            Stage::Input | Stage::Map => Stage::Summarize,
            Stage::Shuffle => Stage::Reduce,
            Stage::Reduce => Stage::Summarize,
            Stage::Summarize | Stage::Done => Stage::Done,
            Stage::Failed { reason } => Stage::Failed {
                reason: reason.clone(),
            },
        }
    }
}

/// Events that can change job state
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A new execution slice has begun
    SliceStarted,
    /// The current stage has no non-terminal work left
    StageComplete,
    /// The slice ran out of budget mid-stage
    Yielded,
    /// A job-fatal error occurred
    Fatal { reason: String },
    /// Cancellation was requested by the caller
    CancelRequested,
    /// A pending cancellation was honored
    Cancelled,
}

/// A submitted job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub config: JobConfig,
    pub plan: JobPlan,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    /// Number of times a slice ended by yielding
    pub yields: u32,
    /// Number of execution slices started
    pub slices: u32,
    #[serde(default)]
    pub cancel_requested: bool,
    /// Stage the job was in when it failed
    #[serde(default)]
    pub failed_in: Option<Stage>,
}

impl Job {
    /// Create a new job in the Input stage
    pub fn new(id: JobId, config: JobConfig, plan: JobPlan, clock: &impl Clock) -> Self {
        Self {
            id,
            config,
            plan,
            stage: Stage::Input,
            created_at: clock.utc_now(),
            yields: 0,
            slices: 0,
            cancel_requested: false,
            failed_in: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    pub fn status(&self) -> JobStatus {
        match &self.stage {
            Stage::Done => JobStatus::Complete,
            Stage::Failed { .. } => JobStatus::Failed,
            Stage::Input if self.slices == 0 => JobStatus::Pending,
            _ => JobStatus::Processing,
        }
    }

    /// Pure transition function - returns new state and effects
    pub fn transition(&self, event: JobEvent, clock: &impl Clock) -> (Job, Vec<Effect>) {
        if self.is_terminal() {
            return (self.clone(), vec![]);
        }

        match event {
            JobEvent::SliceStarted => {
                let job = Job {
                    slices: self.slices + 1,
                    ..self.clone()
                };
                let effects = vec![Effect::Emit(Event::SliceStarted {
                    id: self.id.clone(),
                    slice: job.slices,
                    stage: self.stage.name().to_string(),
                })];
                (job, effects)
            }

            JobEvent::StageComplete => {
                let next = self.plan.next_stage(&self.stage);
                let job = Job {
                    stage: next.clone(),
                    ..self.clone()
                };
                let mut effects = vec![];
                if next == Stage::Done {
                    effects.push(Effect::Archive);
                    effects.push(Effect::Emit(Event::JobCompleted {
                        id: self.id.clone(),
                        at: clock.utc_now(),
                    }));
                } else {
                    effects.push(Effect::Emit(Event::StageEntered {
                        id: self.id.clone(),
                        stage: next.name().to_string(),
                    }));
                }
                effects.push(Effect::SaveCheckpoint);
                (job, effects)
            }

            JobEvent::Yielded => {
                let job = Job {
                    yields: self.yields + 1,
                    ..self.clone()
                };
                let effects = vec![
                    Effect::Emit(Event::SliceYielded {
                        id: self.id.clone(),
                        stage: self.stage.name().to_string(),
                        yields: job.yields,
                    }),
                    Effect::SaveCheckpoint,
                ];
                (job, effects)
            }

            JobEvent::Fatal { reason } => self.fail(reason, clock),

            JobEvent::CancelRequested => {
                if self.cancel_requested {
                    return (self.clone(), vec![]);
                }
                let job = Job {
                    cancel_requested: true,
                    ..self.clone()
                };
                let effects = vec![
                    Effect::Emit(Event::CancelRequested {
                        id: self.id.clone(),
                    }),
                    Effect::SaveCheckpoint,
                ];
                (job, effects)
            }

            JobEvent::Cancelled => self.fail(CANCELLED_REASON.to_string(), clock),
        }
    }

    fn fail(&self, reason: String, clock: &impl Clock) -> (Job, Vec<Effect>) {
        let job = Job {
            stage: Stage::Failed {
                reason: reason.clone(),
            },
            failed_in: Some(self.stage.clone()),
            ..self.clone()
        };
        let effects = vec![
            Effect::Archive,
            Effect::Emit(Event::JobFailed {
                id: self.id.clone(),
                stage: self.stage.name().to_string(),
                reason,
                at: clock.utc_now(),
            }),
            Effect::SaveCheckpoint,
        ];
        (job, effects)
    }
}

/// Failure description recorded for a cancelled job
pub const CANCELLED_REASON: &str = "job cancelled";

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
