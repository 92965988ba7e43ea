// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input partitioner
//!
//! Pages through a [`RecordSource`] and normalizes every descriptor kind to
//! the same ordered sequence of key/value records. Reads are deterministic,
//! so replaying a descriptor after a crash yields the same sequence.

use crate::retry::RetryPolicy;
use sj_core::{
    Clock, Cursor, ExecutionBudget, Governance, InputSource, PhaseCounters, Record, RecordSource,
    SourceError,
};

pub struct InputPartitioner<'a, S> {
    source: &'a S,
    retry: &'a RetryPolicy,
}

impl<'a, S: RecordSource> InputPartitioner<'a, S> {
    pub fn new(source: &'a S, retry: &'a RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Read the whole input, charging `record_read` units per record
    pub async fn read_all<C: Clock, G: Governance>(
        &self,
        input: &InputSource,
        budget: &mut ExecutionBudget<C, G>,
        counters: &mut PhaseCounters,
    ) -> Result<Vec<Record>, SourceError> {
        let per_record = budget.policy().costs.record_read;
        let mut records = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut pages = 0u64;

        loop {
            let source = self.source;
            let current = cursor.as_ref();
            let batch = self
                .retry
                .run("read_batch", move || source.read_batch(input, current))
                .await?;
            pages += 1;

            let units = per_record.saturating_mul(batch.records.len() as u64);
            budget.record_usage(units);
            counters.add_usage(units);
            records.extend(batch.records);

            match batch.next {
                Some(next) if Some(&next) == cursor.as_ref() => {
                    return Err(SourceError::InvalidCursor(next.0));
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::info!(
            kind = input.kind(),
            records = records.len(),
            pages,
            "input read"
        );
        Ok(records)
    }
}

#[cfg(test)]
#[path = "partitioner_tests.rs"]
mod tests;
