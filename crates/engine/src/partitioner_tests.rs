// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sj_core::{BudgetPolicy, FakeClock, FakeGovernance, MemoryRecordSource, UsageCosts};
use std::time::Duration;

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::new(format!("k{i}"), i.to_string()))
        .collect()
}

fn search(page_size: usize) -> InputSource {
    InputSource::Search {
        search_id: "recent".into(),
        page_size,
    }
}

fn budget(governance: &FakeGovernance) -> ExecutionBudget<FakeClock, FakeGovernance> {
    let policy = BudgetPolicy::new(Duration::from_secs(60), 1_000).with_costs(UsageCosts {
        record_read: 2,
        invocation: 0,
        write: 0,
    });
    ExecutionBudget::new(policy, FakeClock::new(), governance.clone(), 0)
}

#[tokio::test]
async fn pages_are_read_in_order_and_charged() {
    let source = MemoryRecordSource::new().with_dataset("recent", records(5));
    let governance = FakeGovernance::new();
    let mut budget = budget(&governance);
    let mut counters = PhaseCounters::default();
    let retry = RetryPolicy::immediate(1);

    let read = InputPartitioner::new(&source, &retry)
        .read_all(&search(2), &mut budget, &mut counters)
        .await
        .unwrap();

    assert_eq!(read, records(5));
    assert_eq!(source.reads().len(), 3);
    assert_eq!(governance.total(), 10);
    assert_eq!(counters.usage, 10);
}

#[tokio::test]
async fn empty_input_reads_one_page() {
    let source = MemoryRecordSource::new().with_dataset("recent", vec![]);
    let governance = FakeGovernance::new();
    let retry = RetryPolicy::immediate(1);

    let read = InputPartitioner::new(&source, &retry)
        .read_all(&search(10), &mut budget(&governance), &mut PhaseCounters::default())
        .await
        .unwrap();
    assert!(read.is_empty());
    assert_eq!(governance.calls(), 0);
}

#[tokio::test]
async fn transient_read_failures_are_retried() {
    let source = MemoryRecordSource::new().with_dataset("recent", records(3));
    source.fail_next(2);
    let governance = FakeGovernance::new();
    let retry = RetryPolicy::immediate(3);

    let read = InputPartitioner::new(&source, &retry)
        .read_all(&search(10), &mut budget(&governance), &mut PhaseCounters::default())
        .await
        .unwrap();
    assert_eq!(read.len(), 3);
    assert_eq!(source.reads(), vec![None, None, None]);
}

#[tokio::test]
async fn missing_input_is_an_error() {
    let source = MemoryRecordSource::new();
    let governance = FakeGovernance::new();
    let retry = RetryPolicy::immediate(3);

    let err = InputPartitioner::new(&source, &retry)
        .read_all(&search(10), &mut budget(&governance), &mut PhaseCounters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
    assert_eq!(source.reads().len(), 1);
}
