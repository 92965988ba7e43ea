// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-facing status reports

use crate::checkpoint::JobCheckpoint;
use crate::job::{JobId, JobStatus, Stage};
use serde::{Deserialize, Serialize};

// Relative weight of each stage in percent_complete
const INPUT_WEIGHT: f64 = 5.0;
const MAP_WEIGHT: f64 = 45.0;
const SHUFFLE_WEIGHT: f64 = 5.0;
const REDUCE_WEIGHT: f64 = 40.0;
const SUMMARIZE_WEIGHT: f64 = 5.0;

/// Work item and output counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub pending_map: usize,
    pub total_map: usize,
    pub pending_reduce: usize,
    pub total_reduce: usize,
    pub pending_output: u64,
    pub total_output: u64,
}

/// Snapshot answer to a status query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub job_id: JobId,
    pub stage: String,
    pub status: JobStatus,
    pub counts: StageCounts,
    pub percent_complete: f64,
    /// Description of a job-fatal error
    pub error: Option<String>,
}

impl StatusReport {
    pub fn from_checkpoint(checkpoint: &JobCheckpoint) -> Self {
        let job = &checkpoint.job;
        let (total_output, pending_output) = match &checkpoint.summary {
            Some(summary) => (summary.output_len() as u64, 0),
            None => (checkpoint.watermarks.output, checkpoint.watermarks.output),
        };
        let error = match &job.stage {
            Stage::Failed { reason } => Some(reason.clone()),
            _ => None,
        };
        Self {
            job_id: job.id.clone(),
            stage: job.stage.name().to_string(),
            status: job.status(),
            counts: StageCounts {
                pending_map: checkpoint.map.pending(),
                total_map: checkpoint.map.total(),
                pending_reduce: checkpoint.reduce.pending(),
                total_reduce: checkpoint.reduce.total(),
                pending_output,
                total_output,
            },
            percent_complete: percent_complete(checkpoint),
            error,
        }
    }
}

fn item_progress(total: usize, pending: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (total - pending) as f64 / total as f64
}

/// Weighted progress over the stages this job runs
///
/// A FAILED job reports the progress it had reached in the stage it failed
/// in, so a job that never got past INPUT stays at zero.
fn percent_complete(checkpoint: &JobCheckpoint) -> f64 {
    let plan = checkpoint.job.plan;
    let stages = [
        (Stage::Input, INPUT_WEIGHT, true),
        (Stage::Map, MAP_WEIGHT, plan.map),
        (Stage::Shuffle, SHUFFLE_WEIGHT, plan.reduce),
        (Stage::Reduce, REDUCE_WEIGHT, plan.reduce),
        (Stage::Summarize, SUMMARIZE_WEIGHT, true),
    ];

    let current = match &checkpoint.job.stage {
        Stage::Done => return 100.0,
        Stage::Failed { .. } => checkpoint.job.failed_in.clone().unwrap_or(Stage::Input),
        stage => stage.clone(),
    };

    let total_weight: f64 = stages.iter().filter(|s| s.2).map(|s| s.1).sum();
    let mut done = 0.0;
    for (stage, weight, enabled) in &stages {
        if !enabled {
            continue;
        }
        if *stage == current {
            let fraction = match stage {
                Stage::Map => item_progress(checkpoint.map.total(), checkpoint.map.pending()),
                Stage::Reduce => {
                    item_progress(checkpoint.reduce.total(), checkpoint.reduce.pending())
                }
                _ => 0.0,
            };
            done += weight * fraction;
            break;
        }
        done += weight;
    }
    (done / total_weight * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
