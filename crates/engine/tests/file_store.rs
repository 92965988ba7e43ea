// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs driven slice by slice against the file-backed store, reopening the
//! store between slices the way separate processes would.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use sj_core::{
    map_fn, reduce_fn, BudgetPolicy, FileFormat, InputSource, JobConfig, JobDefinition, JobId,
    JobRegistry, JobStatus, SequentialIdGen, SpoolEntry, Stage, StateStore, Stream, SystemClock,
    TracingGovernance, UsageCosts,
};
use sj_engine::{Engine, EngineConfig, EngineDeps, RetryPolicy};
use sj_storage::{FileRecordSource, FileStateStore};
use std::path::Path;
use std::time::Duration;

type FileEngine =
    Engine<FileRecordSource, FileStateStore, TracingGovernance, SystemClock, SequentialIdGen>;

fn registry() -> JobRegistry {
    JobRegistry::new().register(
        "word-count",
        JobDefinition::new()
            .with_mapper(map_fn(|ctx, out| {
                for word in ctx.value.split_whitespace() {
                    out.write(word.to_lowercase(), "1");
                }
                Ok(())
            }))
            .with_reducer(reduce_fn(|ctx, out| {
                out.write(ctx.key.clone(), ctx.values.len().to_string());
                Ok(())
            })),
    )
}

fn open(dir: &Path) -> FileEngine {
    let deps = EngineDeps {
        source: FileRecordSource::new()
            .with_base_dir(dir)
            .with_batch_lines(2),
        store: FileStateStore::open(dir.join("state")).unwrap(),
        governance: TracingGovernance,
    };
    let config = EngineConfig {
        retry: RetryPolicy::immediate(2),
    };
    Engine::new(
        deps,
        config,
        registry(),
        SystemClock,
        SequentialIdGen::new("wc"),
    )
}

fn word_count_config(max_units: u64) -> JobConfig {
    let input = InputSource::File {
        path: "words.txt".into(),
        format: FileFormat::Lines,
    };
    let budget = BudgetPolicy::new(Duration::from_secs(600), max_units)
        .with_costs(UsageCosts::per_invocation(1));
    JobConfig::new("word-count", input)
        .with_budget(budget)
        .with_concurrency(2)
}

fn write_input(dir: &Path) {
    std::fs::write(
        dir.join("words.txt"),
        "the quick fox\nthe lazy dog\n\nQuick quick the end\n",
    )
    .unwrap();
}

fn counts(summary: &sj_core::JobSummary) -> Vec<(String, String)> {
    summary
        .output()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect()
}

async fn drive(dir: &Path, id: &JobId) -> u32 {
    let mut slices = 0;
    loop {
        // A fresh engine per slice, as a new process would build
        let report = open(dir).run_slice(id).await.unwrap();
        slices += 1;
        if report.stage.is_terminal() {
            return slices;
        }
        assert!(slices < 100, "job made no progress");
    }
}

#[tokio::test]
async fn sliced_job_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path());

    let id = open(dir.path()).submit(word_count_config(2)).await.unwrap();
    let slices = drive(dir.path(), &id).await;
    assert!(slices > 1);

    let summary = open(dir.path()).get_summary(&id).await.unwrap();
    assert_eq!(summary.status, JobStatus::Complete);
    assert_eq!(summary.slices, slices);
    assert_eq!(
        counts(&summary),
        vec![
            ("the".into(), "3".into()),
            ("quick".into(), "3".into()),
            ("fox".into(), "1".into()),
            ("lazy".into(), "1".into()),
            ("dog".into(), "1".into()),
            ("end".into(), "1".into()),
        ]
    );
    // Spools are discarded once the summary is archived
    let job_dir = dir.path().join("state").join("jobs").join(&id.0);
    assert!(!job_dir.join("intermediate.jsonl").exists());
    assert!(!job_dir.join("output.jsonl").exists());
}

#[tokio::test]
async fn pairs_past_the_checkpoint_are_not_double_counted() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path());

    let engine = open(dir.path());
    let id = engine
        .submit(word_count_config(2).with_concurrency(1))
        .await
        .unwrap();
    let report = engine.run_slice(&id).await.unwrap();
    assert!(report.yielded);
    assert_eq!(report.stage, Stage::Map);

    // Work a crashed slice spooled without checkpointing
    let store = FileStateStore::open(dir.path().join("state")).unwrap();
    store
        .append(
            &id,
            Stream::Intermediate,
            &[SpoolEntry::new("the", "1", 0, 9), SpoolEntry::new("ghost", "1", 0, 10)],
        )
        .await
        .unwrap();

    drive(dir.path(), &id).await;
    let summary = open(dir.path()).get_summary(&id).await.unwrap();
    let output = counts(&summary);
    assert!(output.contains(&("the".into(), "3".into())));
    assert!(!output.iter().any(|(k, _)| k == "ghost"));
}

#[tokio::test]
async fn missing_input_file_fails_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path());
    let id = engine.submit(word_count_config(100)).await.unwrap();

    let report = engine.run_slice(&id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    let status = engine.check_status(&id).await.unwrap();
    assert!(status.error.unwrap().starts_with("source error: input not found"));
}

#[tokio::test]
async fn persisted_cancel_reaches_a_later_process() {
    let dir = tempfile::tempdir().unwrap();
    write_input(dir.path());
    let id = open(dir.path()).submit(word_count_config(100)).await.unwrap();

    open(dir.path()).cancel(&id).await.unwrap();
    let report = open(dir.path()).run_slice(&id).await.unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    let summary = open(dir.path()).get_summary(&id).await.unwrap();
    assert_eq!(summary.error(), Some("job cancelled"));
}
