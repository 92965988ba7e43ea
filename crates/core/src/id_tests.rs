// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn is_path_safe(id: &JobId) -> bool {
    !id.0.is_empty() && id.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[test]
fn uuid_ids_are_path_safe_and_sort_in_issue_order() {
    let id_gen = UuidIdGen;
    let ids: Vec<JobId> = (0..5)
        .map(|_| {
            std::thread::sleep(Duration::from_millis(2));
            id_gen.next()
        })
        .collect();
    assert!(ids.iter().all(is_path_safe));
    assert!(ids.iter().all(|id| id.0.len() == 32));

    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, ids);
}

#[test]
fn sequential_ids_share_a_counter_across_clones() {
    let id_gen = SequentialIdGen::new("wc");
    let clone = id_gen.clone();
    assert_eq!(id_gen.next().0, "wc-0001");
    assert_eq!(clone.next().0, "wc-0002");
    assert_eq!(id_gen.next().0, "wc-0003");
}

#[test]
fn sequential_ids_sort_past_nine() {
    let id_gen = SequentialIdGen::default();
    let ids: Vec<JobId> = (0..12).map(|_| id_gen.next()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(sorted, ids);
    assert!(ids.iter().all(is_path_safe));
    assert_eq!(ids[11].0, "job-0012");
}
