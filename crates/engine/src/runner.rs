// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage runner: drives a user function over the work items of MAP or REDUCE
//!
//! Items are dispatched to a pool of at most `concurrency` tasks, never more
//! than one per key. The budget and the cancel flag are polled before each
//! dispatch; once either trips, no new item starts and in-flight items run
//! to completion. Each invocation runs in its own task so a panic is
//! recorded against its key like any other failure. The tasks belong to the
//! runner's `JoinSet` alone, so leaving `run` early aborts every invocation
//! still in flight.

use crate::error::EngineError;
use crate::retry::RetryPolicy;
use sj_core::{
    Clock, Emitter, ExecutionBudget, FailureDisposition, Governance, JobId, KeyError, MapContext,
    Mapper, ReduceContext, Reducer, SpoolEntry, SpoolWatermarks, StageState, StateStore, Stream,
    WorkItem,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinSet};

/// Shared flag a caller sets to stop a running slice at its next checkpoint
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a stage run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageProgress {
    /// Every item reached a terminal state
    Finished,
    /// The budget ran out with items still pending
    Yielded,
    /// Cancellation was requested with items still pending
    Cancelled,
}

/// The user function a stage applies
#[derive(Clone)]
pub enum StageFunction {
    Map(Arc<dyn Mapper>),
    Reduce(Arc<dyn Reducer>),
}

impl StageFunction {
    async fn invoke(
        &self,
        item: &WorkItem,
        is_restarted: bool,
        out: &mut Emitter,
    ) -> anyhow::Result<()> {
        match self {
            StageFunction::Map(mapper) => {
                let ctx = MapContext {
                    key: item.key.clone(),
                    value: item.values.first().cloned().unwrap_or_default(),
                    execution_no: item.execution_no(),
                    is_restarted,
                };
                mapper.map(&ctx, out).await
            }
            StageFunction::Reduce(reducer) => {
                let ctx = ReduceContext {
                    key: item.key.clone(),
                    values: item.values.clone(),
                    execution_no: item.execution_no(),
                    is_restarted,
                };
                reducer.reduce(&ctx, out).await
            }
        }
    }
}

/// A finished invocation: the function's result and what it wrote
type Invocation = (anyhow::Result<()>, Emitter);

pub struct StageRunner<'a, T> {
    pub job_id: &'a JobId,
    pub store: &'a T,
    pub retry: &'a RetryPolicy,
    pub function: StageFunction,
    /// Stream the function's writes are spooled to
    pub target: Stream,
    pub concurrency: usize,
    pub is_restarted: bool,
    pub cancel: &'a CancelFlag,
}

impl<T: StateStore> StageRunner<'_, T> {
    pub async fn run<C: Clock, G: Governance>(
        &self,
        state: &mut StageState,
        watermarks: &mut SpoolWatermarks,
        budget: &mut ExecutionBudget<C, G>,
    ) -> Result<StageProgress, EngineError> {
        let mut queue: VecDeque<usize> = state
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_terminal())
            .map(|(index, _)| index)
            .collect();
        let mut busy: HashSet<String> = HashSet::new();
        let mut tasks: JoinSet<Invocation> = JoinSet::new();
        let mut in_flight: HashMap<task::Id, usize> = HashMap::new();
        let mut stop = None;

        loop {
            while stop.is_none() && tasks.len() < self.concurrency.max(1) {
                if self.cancel_requested().await? {
                    stop = Some(StageProgress::Cancelled);
                    break;
                }
                if budget.should_yield() {
                    stop = Some(StageProgress::Yielded);
                    break;
                }
                let Some(pos) = queue
                    .iter()
                    .position(|&i| !busy.contains(&state.items[i].key))
                else {
                    break;
                };
                let Some(index) = queue.remove(pos) else {
                    break;
                };

                let item = state.items[index].clone();
                busy.insert(item.key.clone());
                let handle = self.spawn(&mut tasks, item);
                in_flight.insert(handle.id(), index);
                state.counters.observe_concurrency(tasks.len());
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };
            let (id, outcome) = match joined {
                Ok((id, invocation)) => (id, Ok(invocation)),
                Err(e) => (e.id(), Err(e)),
            };
            let index = in_flight
                .remove(&id)
                .ok_or_else(|| EngineError::Worker(format!("unknown invocation task {id}")))?;
            busy.remove(&state.items[index].key);
            if let Some(retry) = self
                .settle(state, watermarks, budget, index, outcome)
                .await?
            {
                queue.push_back(retry);
            }
        }

        if state.is_finished() {
            return Ok(StageProgress::Finished);
        }
        Ok(stop.unwrap_or(StageProgress::Yielded))
    }

    fn spawn(&self, tasks: &mut JoinSet<Invocation>, item: WorkItem) -> task::AbortHandle {
        let function = self.function.clone();
        let is_restarted = self.is_restarted;
        tracing::debug!(
            key = %item.key,
            attempt = item.execution_no(),
            is_restarted,
            "dispatching"
        );
        tasks.spawn(async move {
            let mut out = Emitter::new();
            let result = function.invoke(&item, is_restarted, &mut out).await;
            (result, out)
        })
    }

    /// The caller's flag, or a request another process left in the store
    async fn cancel_requested(&self) -> Result<bool, EngineError> {
        if self.cancel.is_cancelled() {
            return Ok(true);
        }
        let (store, job) = (self.store, self.job_id);
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

    /// Record an invocation's outcome; returns the item index if it should be retried
    async fn settle<C: Clock, G: Governance>(
        &self,
        state: &mut StageState,
        watermarks: &mut SpoolWatermarks,
        budget: &mut ExecutionBudget<C, G>,
        index: usize,
        outcome: Result<Invocation, JoinError>,
    ) -> Result<Option<usize>, EngineError> {
        let costs = budget.policy().costs;
        let (error, units) = match outcome {
            Ok((Ok(()), out)) => {
                let writes = out.writes().len() as u64;
                let units = costs
                    .invocation
                    .saturating_add(costs.write.saturating_mul(writes))
                    .saturating_add(out.units());
                let origin = state.items[index].ordinal;
                self.commit(origin, out, watermarks).await?;
                (None, units)
            }
            Ok((Err(e), out)) => (
                Some(format!("{e:#}")),
                costs.invocation.saturating_add(out.units()),
            ),
            Err(e) => (Some(describe_join_error(e)), costs.invocation),
        };

        budget.record_usage(units);
        state.counters.add_usage(units);

        let item = &mut state.items[index];
        let Some(error) = error else {
            item.record_success();
            tracing::debug!(key = %item.key, attempt = item.attempts, units, "item complete");
            return Ok(None);
        };

        let attempt = item.execution_no();
        let disposition = item.record_failure();
        tracing::warn!(
            key = %item.key,
            attempt,
            error = %error,
            exhausted = disposition == FailureDisposition::Exhausted,
            "item failed"
        );
        state.errors.push(KeyError {
            key: item.key.clone(),
            error,
            attempt,
        });
        Ok(match disposition {
            FailureDisposition::Retry => Some(index),
            FailureDisposition::Exhausted => None,
        })
    }

    /// Spool a successful invocation's writes and advance the watermark
    async fn commit(
        &self,
        origin: u64,
        out: Emitter,
        watermarks: &mut SpoolWatermarks,
    ) -> Result<(), EngineError> {
        let entries: Vec<SpoolEntry> = out
            .into_writes()
            .into_iter()
            .zip(0u64..)
            .map(|((key, value), seq)| SpoolEntry::new(key, value, origin, seq))
            .collect();
        if entries.is_empty() {
            return Ok(());
        }

        let (store, job, stream, entries) = (self.store, self.job_id, self.target, &entries);
        let len = self
            .retry
            .run("append", move || store.append(job, stream, entries))
            .await?;
        watermarks.set(self.target, len);
        Ok(())
    }
}

pub(crate) fn describe_join_error(err: JoinError) -> String {
    if !err.is_panic() {
        return format!("invocation aborted: {err}");
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panicked: {message}")
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
