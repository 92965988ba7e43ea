// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effects and events produced by job transitions

use crate::job::JobId;
use crate::traced::TracedEffect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effects are side effects that the job state machine requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Emit an event for observers (logged by the scheduler)
    Emit(Event),
    /// Persist the job checkpoint
    SaveCheckpoint,
    /// Freeze the job summary and discard spooled pairs
    Archive,
}

/// Events emitted by the job state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    JobSubmitted {
        id: JobId,
        definition: String,
    },
    SliceStarted {
        id: JobId,
        slice: u32,
        stage: String,
    },
    StageEntered {
        id: JobId,
        stage: String,
    },
    SliceYielded {
        id: JobId,
        stage: String,
        yields: u32,
    },
    CancelRequested {
        id: JobId,
    },
    JobCompleted {
        id: JobId,
        at: DateTime<Utc>,
    },
    JobFailed {
        id: JobId,
        stage: String,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Event name, formatted as "category:action"
    pub fn name(&self) -> &'static str {
        match self {
            Event::JobSubmitted { .. } => "job:submitted",
            Event::SliceStarted { .. } => "slice:started",
            Event::StageEntered { .. } => "stage:entered",
            Event::SliceYielded { .. } => "slice:yielded",
            Event::CancelRequested { .. } => "job:cancel_requested",
            Event::JobCompleted { .. } => "job:completed",
            Event::JobFailed { .. } => "job:failed",
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Event::JobSubmitted { id, .. }
            | Event::SliceStarted { id, .. }
            | Event::StageEntered { id, .. }
            | Event::SliceYielded { id, .. }
            | Event::CancelRequested { id }
            | Event::JobCompleted { id, .. }
            | Event::JobFailed { id, .. } => id,
        }
    }
}

impl TracedEffect for Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::Emit(_) => "emit",
            Effect::SaveCheckpoint => "save_checkpoint",
            Effect::Archive => "archive",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Emit(event) => {
                let mut fields = vec![("event", event.name().to_string())];
                match event {
                    Event::SliceStarted { slice, stage, .. } => {
                        fields.push(("slice", slice.to_string()));
                        fields.push(("stage", stage.clone()));
                    }
                    Event::StageEntered { stage, .. } => {
                        fields.push(("stage", stage.clone()));
                    }
                    Event::SliceYielded { stage, yields, .. } => {
                        fields.push(("stage", stage.clone()));
                        fields.push(("yields", yields.to_string()));
                    }
                    Event::JobFailed { stage, reason, .. } => {
                        fields.push(("stage", stage.clone()));
                        fields.push(("reason", reason.clone()));
                    }
                    Event::JobSubmitted { definition, .. } => {
                        fields.push(("definition", definition.clone()));
                    }
                    Event::CancelRequested { .. } | Event::JobCompleted { .. } => {}
                }
                fields
            }
            Effect::SaveCheckpoint | Effect::Archive => vec![],
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
