// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sj_core::{
    FakeClock, InputSource, Job, JobConfig, JobId, JobPlan, MemoryStateStore, SpoolEntry, Stage,
};

fn checkpoint(stage: Stage) -> JobCheckpoint {
    let config = JobConfig::new(
        "echo",
        InputSource::Query {
            query: "q".into(),
            page_size: 10,
        },
    );
    let plan = JobPlan {
        map: true,
        reduce: false,
    };
    let mut job = Job::new(JobId::from("job-1"), config, plan, &FakeClock::new());
    job.stage = stage;
    JobCheckpoint::new(job)
}

struct Setup {
    store: MemoryStateStore,
    clock: FakeClock,
    retry: RetryPolicy,
}

impl Setup {
    fn new() -> Self {
        Self {
            store: MemoryStateStore::new(),
            clock: FakeClock::new(),
            retry: RetryPolicy::immediate(2),
        }
    }

    fn executor(&self) -> Executor<'_, MemoryStateStore, FakeClock> {
        Executor::new(&self.store, &self.clock, &self.retry)
    }
}

#[tokio::test]
async fn stage_complete_emits_and_saves() {
    let setup = Setup::new();
    let mut executor = setup.executor();
    let mut cp = checkpoint(Stage::Input);

    executor.apply(&mut cp, JobEvent::StageComplete).await.unwrap();

    assert_eq!(cp.job.stage, Stage::Map);
    assert_eq!(cp.sequence, 1);
    assert_eq!(setup.store.checkpoint_saves(), 1);
    let saved = setup.store.load_checkpoint(&cp.job.id).await.unwrap().unwrap();
    assert_eq!(saved.job.stage, Stage::Map);
    let events = executor.into_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name(), "stage:entered");
}

#[tokio::test]
async fn completion_archives_output_then_discards_spools() {
    let setup = Setup::new();
    let mut cp = checkpoint(Stage::Summarize);
    let id = cp.job.id.clone();
    setup.store.inject(
        &id,
        Stream::Output,
        vec![
            SpoolEntry::new("late", "2", 5, 0),
            SpoolEntry::new("early", "1", 1, 0),
        ],
    );
    cp.watermarks.output = 2;

    let mut executor = setup.executor();
    executor.apply(&mut cp, JobEvent::StageComplete).await.unwrap();

    assert_eq!(cp.job.stage, Stage::Done);
    let summary = cp.summary.as_ref().unwrap();
    assert_eq!(summary.status, JobStatus::Complete);
    let keys: Vec<&str> = summary.output().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["early", "late"]);
    assert_eq!(setup.store.spool_len(&id, Stream::Output), 0);

    let saved = setup.store.load_checkpoint(&id).await.unwrap().unwrap();
    assert_eq!(saved.summary.unwrap().output_len(), 2);
    let names: Vec<&str> = executor.into_events().iter().map(Event::name).collect();
    assert_eq!(names, vec!["job:completed"]);
}

#[tokio::test]
async fn fatal_error_replaces_a_stale_summary() {
    let setup = Setup::new();
    let mut cp = checkpoint(Stage::Summarize);
    cp.summary = Some(build_summary(&cp, JobStatus::Complete, vec![]));

    let mut executor = setup.executor();
    executor
        .apply(
            &mut cp,
            JobEvent::Fatal {
                reason: "store offline".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(cp.job.status(), JobStatus::Failed);
    assert_eq!(cp.summary.as_ref().unwrap().status, JobStatus::Failed);
    match &executor.into_events()[0] {
        Event::JobFailed { stage, reason, .. } => {
            assert_eq!(stage, "SUMMARIZE");
            assert_eq!(reason, "store offline");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn save_failure_propagates() {
    let setup = Setup::new();
    setup.store.set_unavailable(true);
    let mut cp = checkpoint(Stage::Map);
    let err = setup
        .executor()
        .apply(&mut cp, JobEvent::Yielded)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
}

#[tokio::test]
async fn transient_save_failure_is_retried() {
    let setup = Setup::new();
    setup.store.fail_next(1);
    let mut cp = checkpoint(Stage::Map);
    setup
        .executor()
        .apply(&mut cp, JobEvent::Yielded)
        .await
        .unwrap();
    assert_eq!(cp.job.yields, 1);
    assert_eq!(setup.store.checkpoint_saves(), 1);
}
