// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle specs: submit, run, status, summary, cancel

use crate::prelude::*;

#[test]
fn word_count_runs_to_completion() {
    let project = Project::empty();
    project
        .file("data/words.txt", TEXT)
        .file("data/job.toml", &word_count_job("words.txt", 10_000));

    let id = project.submit("data/job.toml");

    project
        .sj()
        .args(["run", &id, "--all"])
        .passes()
        .stdout_has("DONE COMPLETE");

    project
        .sj()
        .args(["summary", &id])
        .passes()
        .stdout_has("status    COMPLETE")
        .stdout_has("the\t3")
        .stdout_has("quick\t2");
}

#[test]
fn small_budget_yields_between_runs() {
    let project = Project::empty();
    project
        .file("words.txt", TEXT)
        .file("job.toml", &word_count_job("words.txt", 8));

    let id = project.submit("job.toml");

    project
        .sj()
        .args(["run", &id])
        .passes()
        .stdout_has("(yielded)");

    project
        .sj()
        .args(["status", &id])
        .passes()
        .stdout_has("status    PROCESSING");

    project
        .sj()
        .args(["summary", &id])
        .fails()
        .stderr_has("not available while it is PROCESSING");

    project
        .sj()
        .args(["run", &id, "--all"])
        .passes()
        .stdout_has("DONE COMPLETE");

    project
        .sj()
        .args(["summary", &id])
        .passes()
        .stdout_has("the\t3");
}

#[test]
fn status_without_a_job_lists_all_jobs() {
    let project = Project::empty();
    project.sj().arg("status").passes().stdout_has("No jobs");

    project
        .file("words.txt", TEXT)
        .file("job.toml", &word_count_job("words.txt", 10_000));
    let first = project.submit("job.toml");
    let second = project.submit("job.toml");

    project
        .sj()
        .arg("status")
        .passes()
        .stdout_has(&first)
        .stdout_has(&second);
}

#[test]
fn cancel_stops_a_yielded_job() {
    let project = Project::empty();
    project
        .file("words.txt", TEXT)
        .file("job.toml", &word_count_job("words.txt", 8));
    let id = project.submit("job.toml");
    project.sj().args(["run", &id]).passes();

    project.sj().args(["cancel", &id]).passes();
    project.sj().args(["run", &id]).passes().stdout_has("FAILED");

    project
        .sj()
        .args(["status", &id])
        .passes()
        .stdout_has("status    FAILED")
        .stdout_has("error     job cancelled");
}

#[test]
fn json_output_is_machine_readable() {
    let project = Project::empty();
    project
        .file("words.txt", TEXT)
        .file("job.toml", &word_count_job("words.txt", 10_000));
    let id = project.submit("job.toml");
    project.sj().args(["run", &id, "--all"]).passes();

    let out = project
        .sj()
        .args(["-o", "json", "summary", &id])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["status"], "COMPLETE");
    assert_eq!(json["job_id"], id.as_str());
    assert!(json["output"]
        .as_array()
        .unwrap()
        .iter()
        .any(|pair| pair["key"] == "fox" && pair["value"] == "1"));
}
