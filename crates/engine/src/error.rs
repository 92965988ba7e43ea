// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use sj_core::{ConfigError, JobId, JobStatus, SourceError, StoreError};
use thiserror::Error;

/// Errors surfaced to the engine's caller
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("a slice of job {0} is already running")]
    SliceInFlight(JobId),
    #[error("summary of job {id} is not available while it is {status}")]
    SummaryUnavailable { id: JobId, status: JobStatus },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("definition {definition} has no function for the {stage} stage")]
    MissingFunction {
        definition: String,
        stage: &'static str,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("worker error: {0}")]
    Worker(String),
}
