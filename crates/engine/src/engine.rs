// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-facing engine API

use crate::error::EngineError;
use crate::executor::Executor;
use crate::retry::RetryPolicy;
use crate::runner::CancelFlag;
use crate::scheduler::{Scheduler, SliceReport};
use serde::{Deserialize, Serialize};
use sj_core::{
    Clock, Event, Governance, IdGen, Job, JobCheckpoint, JobConfig, JobDefinition, JobEvent,
    JobId, JobPlan, JobRegistry, JobSummary, RecordSource, StateStore, StatusReport,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Engine adapter dependencies
pub struct EngineDeps<S, T, G> {
    pub source: S,
    pub store: T,
    pub governance: G,
}

/// Engine-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retry policy for transient record source and state store failures
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Staged, resumable map/reduce engine
pub struct Engine<S, T, G, C: Clock, I: IdGen> {
    deps: EngineDeps<S, T, G>,
    registry: JobRegistry,
    clock: C,
    id_gen: I,
    retry: RetryPolicy,
    /// Cancel flags of slices in flight, keyed by job
    running: Mutex<HashMap<JobId, CancelFlag>>,
}

/// Releases a job's in-flight slot when dropped
struct SliceGuard<'a> {
    running: &'a Mutex<HashMap<JobId, CancelFlag>>,
    id: JobId,
    cancel: CancelFlag,
}

impl Drop for SliceGuard<'_> {
    fn drop(&mut self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(&self.id);
    }
}

impl<S, T, G, C, I> Engine<S, T, G, C, I>
where
    S: RecordSource,
    T: StateStore,
    G: Governance,
    C: Clock,
    I: IdGen,
{
    pub fn new(
        deps: EngineDeps<S, T, G>,
        config: EngineConfig,
        registry: JobRegistry,
        clock: C,
        id_gen: I,
    ) -> Self {
        Self {
            deps,
            registry,
            clock,
            id_gen,
            retry: config.retry,
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Accept a job and persist its initial checkpoint
    ///
    /// A configuration that fails validation still yields a job id; the job
    /// is FAILED straight away with the reason on its INPUT summary.
    pub async fn submit(&self, config: JobConfig) -> Result<JobId, EngineError> {
        let id = self.id_gen.next();
        let resolved = self.registry.resolve(&config).map(JobDefinition::plan);
        let plan = match &resolved {
            Ok(plan) => *plan,
            Err(_) => JobPlan {
                map: false,
                reduce: false,
            },
        };

        let mut checkpoint = JobCheckpoint::new(Job::new(id.clone(), config, plan, &self.clock));
        let mut executor = Executor::new(&self.deps.store, &self.clock, &self.retry);
        executor.emit(Event::JobSubmitted {
            id: id.clone(),
            definition: checkpoint.job.config.definition.clone(),
        });

        match resolved {
            Ok(_) => executor.save(&mut checkpoint).await?,
            Err(e) => {
                let reason = EngineError::from(e).to_string();
                tracing::warn!(job_id = %id, error = %reason, "rejecting job configuration");
                checkpoint.input.start(self.clock.utc_now());
                checkpoint.input.error = Some(reason.clone());
                executor
                    .apply(&mut checkpoint, JobEvent::Fatal { reason })
                    .await?;
            }
        }
        Ok(id)
    }

    /// Run one budget-limited execution slice of a job
    ///
    /// The job's store lock is held for the whole slice, so a second engine
    /// over the same store gets [`EngineError::SliceInFlight`].
    pub async fn run_slice(&self, id: &JobId) -> Result<SliceReport, EngineError> {
        let guard = self
            .claim(id)
            .map_err(|_| EngineError::SliceInFlight(id.clone()))?;
        self.load(id).await?;
        let _lock = self
            .deps
            .store
            .try_lock(id)?
            .ok_or_else(|| EngineError::SliceInFlight(id.clone()))?;
        // Reload under the lock; the last holder may have moved the job on
        let checkpoint = self.load(id).await?;
        let scheduler = Scheduler {
            source: &self.deps.source,
            store: &self.deps.store,
            governance: &self.deps.governance,
            clock: &self.clock,
            retry: &self.retry,
            definition: self.registry.get(&checkpoint.job.config.definition),
            cancel: &guard.cancel,
        };
        scheduler.run_slice(checkpoint).await
    }

    /// Run slices until the job is terminal and return its summary
    pub async fn run_to_completion(&self, id: &JobId) -> Result<JobSummary, EngineError> {
        loop {
            let report = self.run_slice(id).await?;
            if report.stage.is_terminal() {
                break;
            }
        }
        self.get_summary(id).await
    }

    pub async fn check_status(&self, id: &JobId) -> Result<StatusReport, EngineError> {
        let checkpoint = self.load(id).await?;
        Ok(StatusReport::from_checkpoint(&checkpoint))
    }

    /// The archived summary of a COMPLETE or FAILED job
    pub async fn get_summary(&self, id: &JobId) -> Result<JobSummary, EngineError> {
        let checkpoint = self.load(id).await?;
        match checkpoint.summary {
            Some(summary) if checkpoint.job.is_terminal() => Ok(summary),
            _ => Err(EngineError::SummaryUnavailable {
                id: id.clone(),
                status: checkpoint.job.status(),
            }),
        }
    }

    /// Request cancellation
    ///
    /// A slice in flight stops at its next between-item checkpoint, whether
    /// it runs in this engine or another one over the same store. Otherwise
    /// the request is persisted and honored when the next slice starts.
    pub async fn cancel(&self, id: &JobId) -> Result<StatusReport, EngineError> {
        let guard = match self.claim(id) {
            Ok(guard) => guard,
            Err(flag) => {
                tracing::info!(job_id = %id, "signalling in-flight slice to cancel");
                flag.cancel();
                return self.check_status(id).await;
            }
        };

        let checkpoint = self.load(id).await?;
        if checkpoint.job.is_terminal() {
            return Ok(StatusReport::from_checkpoint(&checkpoint));
        }
        let Some(lock) = self.deps.store.try_lock(id)? else {
            tracing::info!(job_id = %id, "leaving cancel request for the running writer");
            let store = &self.deps.store;
            self.retry
                .run("request_cancel", move || store.request_cancel(id))
                .await?;
            return Ok(StatusReport::from_checkpoint(&checkpoint));
        };

        let mut checkpoint = self.load(id).await?;
        if !checkpoint.job.is_terminal() {
            let mut executor = Executor::new(&self.deps.store, &self.clock, &self.retry);
            executor
                .apply(&mut checkpoint, JobEvent::CancelRequested)
                .await?;
        }
        drop(lock);
        drop(guard);
        Ok(StatusReport::from_checkpoint(&checkpoint))
    }

    /// Take the job's in-flight slot, or hand back the running slice's flag
    fn claim(&self, id: &JobId) -> Result<SliceGuard<'_>, CancelFlag> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(flag) = running.get(id) {
            return Err(flag.clone());
        }
        let cancel = CancelFlag::new();
        running.insert(id.clone(), cancel.clone());
        Ok(SliceGuard {
            running: &self.running,
            id: id.clone(),
            cancel,
        })
    }

    async fn load(&self, id: &JobId) -> Result<JobCheckpoint, EngineError> {
        let store = &self.deps.store;
        self.retry
            .run("load_checkpoint", move || store.load_checkpoint(id))
            .await?
            .ok_or_else(|| EngineError::JobNotFound(id.clone()))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
