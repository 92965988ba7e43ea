// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job scheduler: drives one execution slice of a job
//!
//! A slice starts from the last persisted checkpoint, rolls both spools back
//! to the committed watermarks, and walks the stages until the job finishes,
//! the budget yields, or cancellation is honored. Stage boundaries and
//! yields persist the checkpoint; a job-fatal error moves the job to FAILED
//! with the description recorded on the phase it happened in.

use crate::error::EngineError;
use crate::executor::{build_summary, read_output, Executor};
use crate::partitioner::InputPartitioner;
use crate::retry::RetryPolicy;
use crate::runner::{describe_join_error, CancelFlag, StageFunction, StageProgress, StageRunner};
use sj_core::{
    group_by_key, Clock, Event, ExecutionBudget, Governance, JobCheckpoint, JobDefinition,
    JobEvent, JobId, JobStatus, PhaseCounters, RecordSource, SpoolEntry, Stage, StateStore,
    Stream, WorkItem, CANCELLED_REASON,
};
use std::time::Duration;
use tracing::Instrument;

/// What one execution slice did
#[derive(Debug, Clone)]
pub struct SliceReport {
    pub job_id: JobId,
    /// Slice number, counting from 1
    pub slice: u32,
    /// Stage the job is in after the slice
    pub stage: Stage,
    pub status: JobStatus,
    /// Whether the slice ended by yielding its budget
    pub yielded: bool,
    pub units_used: u64,
    pub elapsed: Duration,
    pub events: Vec<Event>,
}

pub struct Scheduler<'a, S, T, G, C> {
    pub source: &'a S,
    pub store: &'a T,
    pub governance: &'a G,
    pub clock: &'a C,
    pub retry: &'a RetryPolicy,
    /// `None` when the job's definition is no longer registered
    pub definition: Option<&'a JobDefinition>,
    pub cancel: &'a CancelFlag,
}

impl<S, T, G, C> Scheduler<'_, S, T, G, C>
where
    S: RecordSource,
    T: StateStore,
    G: Governance,
    C: Clock,
{
    pub async fn run_slice(&self, checkpoint: JobCheckpoint) -> Result<SliceReport, EngineError> {
        let span = tracing::info_span!(
            "slice",
            job_id = %checkpoint.job.id,
            slice = checkpoint.job.slices + 1
        );
        self.run_slice_inner(checkpoint).instrument(span).await
    }

    async fn run_slice_inner(
        &self,
        mut checkpoint: JobCheckpoint,
    ) -> Result<SliceReport, EngineError> {
        let mut executor = Executor::new(self.store, self.clock, self.retry);
        let mut budget = ExecutionBudget::new(
            checkpoint.job.config.budget.clone(),
            self.clock.clone(),
            self.governance.clone(),
            checkpoint.carryover_units,
        );

        let mut yielded = false;
        if !checkpoint.job.is_terminal() {
            executor.apply(&mut checkpoint, JobEvent::SliceStarted).await?;
            match self.drive(&mut checkpoint, &mut executor, &mut budget).await {
                Ok(did_yield) => yielded = did_yield,
                Err(e) => self.fail(&mut checkpoint, &mut executor, e).await?,
            }
        }

        let report = SliceReport {
            job_id: checkpoint.job.id.clone(),
            slice: checkpoint.job.slices,
            stage: checkpoint.job.stage.clone(),
            status: checkpoint.job.status(),
            yielded,
            units_used: budget.used_units(),
            elapsed: budget.elapsed(),
            events: executor.into_events(),
        };
        tracing::info!(
            stage = %report.stage,
            status = %report.status,
            yielded,
            units = report.units_used,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "slice ended"
        );
        Ok(report)
    }

    /// Walk the stages; returns whether the slice yielded
    async fn drive(
        &self,
        checkpoint: &mut JobCheckpoint,
        executor: &mut Executor<'_, T, C>,
        budget: &mut ExecutionBudget<C, G>,
    ) -> Result<bool, EngineError> {
        self.restore_spools(checkpoint).await?;
        if checkpoint.job.cancel_requested {
            self.cancel.cancel();
        }

        while !checkpoint.job.is_terminal() {
            if self.cancel_requested(&checkpoint.job.id).await? {
                self.honor_cancel(checkpoint, executor).await?;
                return Ok(false);
            }

            let progress = match checkpoint.job.stage {
                Stage::Input => self.input(checkpoint, budget).await?,
                Stage::Map | Stage::Reduce => self.work(checkpoint, budget).await?,
                Stage::Shuffle => self.shuffle(checkpoint).await?,
                Stage::Summarize => self.summarize(checkpoint).await?,
                Stage::Done | Stage::Failed { .. } => break,
            };
            checkpoint.carryover_units = budget.overrun();

            match progress {
                StageProgress::Finished => {
                    executor.apply(checkpoint, JobEvent::StageComplete).await?;
                }
                StageProgress::Yielded => {
                    if let Some(counters) = checkpoint.counters_mut() {
                        counters.yields += 1;
                    }
                    executor.apply(checkpoint, JobEvent::Yielded).await?;
                    return Ok(true);
                }
                StageProgress::Cancelled => {
                    self.honor_cancel(checkpoint, executor).await?;
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }

    async fn honor_cancel(
        &self,
        checkpoint: &mut JobCheckpoint,
        executor: &mut Executor<'_, T, C>,
    ) -> Result<(), EngineError> {
        tracing::info!(stage = %checkpoint.job.stage, "honoring cancellation");
        if let Some(counters) = error_counters(checkpoint) {
            counters.error = Some(CANCELLED_REASON.to_string());
        }
        executor.apply(checkpoint, JobEvent::Cancelled).await
    }

    /// The caller's flag, or a request another process left in the store
    async fn cancel_requested(&self, job: &JobId) -> Result<bool, EngineError> {
        if self.cancel.is_cancelled() {
            return Ok(true);
        }
        let store = self.store;
        let waiting = self
            .retry
            .run("cancel_requested", move || store.cancel_requested(job))
            .await?;
        if waiting {
            tracing::info!("cancel request found in the store");
            self.cancel.cancel();
        }
        Ok(waiting)
    }

    /// Drop spooled pairs written after the last checkpoint
    async fn restore_spools(&self, checkpoint: &JobCheckpoint) -> Result<(), EngineError> {
        for stream in [Stream::Intermediate, Stream::Output] {
            let (store, job, len) = (self.store, &checkpoint.job.id, checkpoint.watermarks.get(stream));
            self.retry
                .run("truncate", move || store.truncate(job, stream, len))
                .await?;
        }
        Ok(())
    }

    async fn input(
        &self,
        checkpoint: &mut JobCheckpoint,
        budget: &mut ExecutionBudget<C, G>,
    ) -> Result<StageProgress, EngineError> {
        if budget.should_yield() {
            return Ok(StageProgress::Yielded);
        }

        checkpoint.input.start(self.clock.utc_now());
        checkpoint.input.observe_concurrency(1);
        let started = budget.elapsed();
        let records = InputPartitioner::new(self.source, self.retry)
            .read_all(&checkpoint.job.config.input, budget, &mut checkpoint.input)
            .await;
        checkpoint
            .input
            .add_elapsed(budget.elapsed().saturating_sub(started));
        let records = records?;

        checkpoint.records = records.len() as u64;
        let max_attempts = checkpoint.job.config.max_attempts;
        if checkpoint.job.plan.map {
            checkpoint.map.items = records
                .into_iter()
                .enumerate()
                .map(|(i, record)| WorkItem::for_map(i as u64, record, max_attempts))
                .collect();
        } else {
            // Without a map stage the raw records feed the shuffle directly
            let entries: Vec<SpoolEntry> = records
                .into_iter()
                .enumerate()
                .map(|(i, record)| SpoolEntry::new(record.key, record.value, i as u64, 0))
                .collect();
            if !entries.is_empty() {
                let (store, job, entries) = (self.store, &checkpoint.job.id, &entries);
                let len = self
                    .retry
                    .run("append", move || store.append(job, Stream::Intermediate, entries))
                    .await?;
                checkpoint.watermarks.intermediate = len;
            }
        }
        Ok(StageProgress::Finished)
    }

    async fn work(
        &self,
        checkpoint: &mut JobCheckpoint,
        budget: &mut ExecutionBudget<C, G>,
    ) -> Result<StageProgress, EngineError> {
        let stage = checkpoint.job.stage.clone();
        let (function, target) = self.stage_function(checkpoint, &stage)?;
        let job_id = checkpoint.job.id.clone();
        let concurrency = checkpoint.job.config.concurrency;
        let (state, watermarks) = match stage {
            Stage::Map => (&mut checkpoint.map, &mut checkpoint.watermarks),
            _ => (&mut checkpoint.reduce, &mut checkpoint.watermarks),
        };
        let runner = StageRunner {
            job_id: &job_id,
            store: self.store,
            retry: self.retry,
            function,
            target,
            concurrency,
            is_restarted: state.is_resumed(),
            cancel: self.cancel,
        };
        state.counters.start(self.clock.utc_now());
        let started = budget.elapsed();
        let progress = runner.run(state, watermarks, budget).await;
        state
            .counters
            .add_elapsed(budget.elapsed().saturating_sub(started));
        let progress = progress?;

        tracing::info!(
            stage = %stage,
            pending = state.pending(),
            total = state.total(),
            errors = state.errors.len(),
            ?progress,
            "stage run ended"
        );
        Ok(progress)
    }

    fn stage_function(
        &self,
        checkpoint: &JobCheckpoint,
        stage: &Stage,
    ) -> Result<(StageFunction, Stream), EngineError> {
        let missing = || EngineError::MissingFunction {
            definition: checkpoint.job.config.definition.clone(),
            stage: stage.name(),
        };
        let definition = self.definition.ok_or_else(missing)?;
        match stage {
            Stage::Map => {
                let mapper = definition.mapper.clone().ok_or_else(missing)?;
                // Map output is final when there is no reduce stage
                let target = if checkpoint.job.plan.reduce {
                    Stream::Intermediate
                } else {
                    Stream::Output
                };
                Ok((StageFunction::Map(mapper), target))
            }
            _ => {
                let reducer = definition.reducer.clone().ok_or_else(missing)?;
                Ok((StageFunction::Reduce(reducer), Stream::Output))
            }
        }
    }

    async fn shuffle(&self, checkpoint: &mut JobCheckpoint) -> Result<StageProgress, EngineError> {
        let (store, job, limit) = (
            self.store,
            &checkpoint.job.id,
            checkpoint.watermarks.intermediate,
        );
        let entries = self
            .retry
            .run("read_intermediate", move || {
                store.read_stream(job, Stream::Intermediate, limit)
            })
            .await?;

        let groups = group_by_key(&entries);
        let max_attempts = checkpoint.job.config.max_attempts;
        checkpoint.reduce.items = groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| WorkItem::for_reduce(i as u64, group, max_attempts))
            .collect();
        tracing::info!(
            pairs = entries.len(),
            keys = checkpoint.reduce.items.len(),
            "shuffled"
        );
        Ok(StageProgress::Finished)
    }

    async fn summarize(&self, checkpoint: &mut JobCheckpoint) -> Result<StageProgress, EngineError> {
        let output = read_output(self.store, self.retry, checkpoint).await?;
        let summary = build_summary(checkpoint, JobStatus::Complete, output);

        let summarizer = self.definition.and_then(|d| d.summarizer.clone());
        let error = match summarizer {
            None => None,
            Some(summarizer) => {
                let snapshot = summary.clone();
                let handle =
                    tokio::spawn(async move { summarizer.summarize(&snapshot).await });
                match handle.await {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(format!("{e:#}")),
                    Err(e) => Some(describe_join_error(e)),
                }
            }
        };
        if let Some(error) = &error {
            tracing::warn!(error = %error, "summarize function failed");
        }

        checkpoint.summary = Some(summary.with_summarize_error(error));
        Ok(StageProgress::Finished)
    }

    /// Move the job to FAILED after a job-fatal error
    async fn fail(
        &self,
        checkpoint: &mut JobCheckpoint,
        executor: &mut Executor<'_, T, C>,
        error: EngineError,
    ) -> Result<(), EngineError> {
        if checkpoint.job.is_terminal() {
            return Err(error);
        }
        let reason = error.to_string();
        tracing::error!(stage = %checkpoint.job.stage, error = %reason, "job-fatal error");
        if let Some(counters) = error_counters(checkpoint) {
            counters.error = Some(reason.clone());
        }
        executor.apply(checkpoint, JobEvent::Fatal { reason }).await
    }
}

/// Counters of the phase a job-fatal error in the current stage belongs to
fn error_counters(checkpoint: &mut JobCheckpoint) -> Option<&mut PhaseCounters> {
    match checkpoint.job.stage {
        Stage::Input => Some(&mut checkpoint.input),
        Stage::Map => Some(&mut checkpoint.map.counters),
        Stage::Shuffle | Stage::Reduce => Some(&mut checkpoint.reduce.counters),
        Stage::Summarize if checkpoint.job.plan.reduce => Some(&mut checkpoint.reduce.counters),
        Stage::Summarize => Some(&mut checkpoint.map.counters),
        Stage::Done | Stage::Failed { .. } => None,
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
