// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor
//!
//! Applies job events to a checkpoint and carries out the effects the
//! transition requests. Spools are discarded only after the archived
//! summary has been saved, so a crash in between still finds the output.

use crate::error::EngineError;
use crate::retry::RetryPolicy;
use sj_core::shuffle::sort_entries;
use sj_core::{
    Clock, Effect, Event, JobCheckpoint, JobEvent, JobStatus, JobSummary, OutputPair, StateStore,
    Stream, TracedEffect,
};
use tracing::Instrument;

/// Executes job effects against the state store
pub struct Executor<'a, T, C> {
    store: &'a T,
    clock: &'a C,
    retry: &'a RetryPolicy,
    events: Vec<Event>,
    discard_after_save: bool,
}

impl<'a, T: StateStore, C: Clock> Executor<'a, T, C> {
    pub fn new(store: &'a T, clock: &'a C, retry: &'a RetryPolicy) -> Self {
        Self {
            store,
            clock,
            retry,
            events: Vec::new(),
            discard_after_save: false,
        }
    }

    /// Transition the job and execute the resulting effects in order
    pub async fn apply(
        &mut self,
        checkpoint: &mut JobCheckpoint,
        event: JobEvent,
    ) -> Result<(), EngineError> {
        let (job, effects) = checkpoint.job.transition(event, self.clock);
        checkpoint.job = job;
        for effect in effects {
            self.execute(checkpoint, effect).await?;
        }
        Ok(())
    }

    /// Execute a single effect with tracing
    pub async fn execute(
        &mut self,
        checkpoint: &mut JobCheckpoint,
        effect: Effect,
    ) -> Result<(), EngineError> {
        let span = effect.span(&checkpoint.job.id);
        let description = effect.describe();
        let (this, checkpoint) = (self, checkpoint);
        async move {
            tracing::debug!(effect = %description, "executing");
            let start = std::time::Instant::now();
            let result = this.execute_inner(checkpoint, effect).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "completed"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute_inner(
        &mut self,
        checkpoint: &mut JobCheckpoint,
        effect: Effect,
    ) -> Result<(), EngineError> {
        match effect {
            Effect::Emit(event) => {
                self.emit(event);
                Ok(())
            }

            Effect::SaveCheckpoint => {
                self.save(checkpoint).await?;
                if std::mem::take(&mut self.discard_after_save) {
                    let (store, job) = (self.store, &checkpoint.job.id);
                    if let Err(e) = self.retry.run("discard", move || store.discard(job)).await {
                        tracing::warn!(error = %e, "failed to discard spools");
                    }
                }
                Ok(())
            }

            Effect::Archive => {
                let status = checkpoint.job.status();
                let summary = match checkpoint.summary.take() {
                    Some(summary) if summary.status == status => summary,
                    _ => match read_output(self.store, self.retry, checkpoint).await {
                        Ok(output) => build_summary(checkpoint, status, output),
                        Err(e) if status == JobStatus::Failed => {
                            tracing::warn!(error = %e, "output unreadable, archiving without it");
                            build_summary(checkpoint, status, vec![])
                        }
                        Err(e) => return Err(e),
                    },
                };
                checkpoint.summary = Some(summary);
                self.discard_after_save = true;
                Ok(())
            }
        }
    }

    /// Record an event and log it
    pub fn emit(&mut self, event: Event) {
        tracing::info!(job_id = %event.job_id(), event = event.name(), "job event");
        self.events.push(event);
    }

    /// Persist the checkpoint under the next sequence number
    pub async fn save(&mut self, checkpoint: &mut JobCheckpoint) -> Result<(), EngineError> {
        checkpoint.sequence += 1;
        let (store, snapshot) = (self.store, &*checkpoint);
        self.retry
            .run("save_checkpoint", move || store.save_checkpoint(snapshot))
            .await?;
        tracing::debug!(
            sequence = checkpoint.sequence,
            stage = %checkpoint.job.stage,
            "checkpoint saved"
        );
        Ok(())
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// Committed final-output pairs in write order
pub async fn read_output<T: StateStore>(
    store: &T,
    retry: &RetryPolicy,
    checkpoint: &JobCheckpoint,
) -> Result<Vec<OutputPair>, EngineError> {
    let (job, limit) = (&checkpoint.job.id, checkpoint.watermarks.output);
    let mut entries = retry
        .run("read_output", move || {
            store.read_stream(job, Stream::Output, limit)
        })
        .await?;
    sort_entries(&mut entries);
    Ok(entries
        .into_iter()
        .map(|e| OutputPair::new(e.key, e.value))
        .collect())
}

pub fn build_summary(
    checkpoint: &JobCheckpoint,
    status: JobStatus,
    output: Vec<OutputPair>,
) -> JobSummary {
    JobSummary::new(
        checkpoint.job.id.clone(),
        status,
        checkpoint.job.created_at,
        checkpoint.phase_summaries(),
        output,
    )
    .with_slices(checkpoint.job.slices)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
