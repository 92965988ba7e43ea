// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error reporting specs

use crate::prelude::*;

#[test]
fn unknown_job_is_reported() {
    Project::empty()
        .sj()
        .args(["status", "nope"])
        .fails()
        .stderr_has("job not found: nope");
}

#[test]
fn malformed_config_is_rejected_before_submit() {
    let project = Project::empty();
    project.file("job.toml", "definition = [");

    project
        .sj()
        .arg("submit")
        .arg(project.path().join("job.toml"))
        .fails()
        .stderr_has("invalid job configuration");
}

#[test]
fn invalid_config_is_accepted_as_a_failed_job() {
    let project = Project::empty();
    project.file(
        "job.toml",
        r#"
definition = "no-such-job"
[input]
kind = "file"
path = "words.txt"
"#,
    );
    let id = project.submit("job.toml");

    project
        .sj()
        .args(["status", &id])
        .passes()
        .stdout_has("status    FAILED")
        .stdout_has("unknown job definition: no-such-job");
}

#[test]
fn missing_input_fails_the_job() {
    let project = Project::empty();
    project.file("job.toml", &word_count_job("absent.txt", 10_000));
    let id = project.submit("job.toml");

    project.sj().args(["run", &id, "--all"]).passes().stdout_has("FAILED");
    project
        .sj()
        .args(["status", &id])
        .passes()
        .stdout_has("input not found");
}
