// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TEXT: &str = "The quick fox\nthe lazy dog\nThe quick end\n";

pub fn word_count_job(path: &str, max_units: u64) -> String {
    format!(
        r#"
definition = "word-count"

[input]
kind = "file"
path = "{path}"

[budget]
max_units = {max_units}
"#
    )
}

/// A scratch directory with its own state directory
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dir.path().join("state")
    }

    pub fn file(&self, rel: &str, content: &str) -> &Self {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
        self
    }

    /// `sj` pointed at this project's state directory, run from a different cwd
    #[allow(deprecated)]
    pub fn sj(&self) -> Command {
        let mut cmd = Command::cargo_bin("sj").unwrap();
        cmd.arg("--state-dir")
            .arg(self.state_dir())
            .current_dir(std::env::temp_dir())
            .env_remove("SJ_LOG");
        cmd
    }

    /// Submit `config` and return the printed job id
    pub fn submit(&self, config: &str) -> String {
        let out = self
            .sj()
            .args(["submit"])
            .arg(self.dir.path().join(config))
            .output()
            .unwrap();
        assert!(out.status.success(), "submit failed: {:?}", out);
        String::from_utf8(out.stdout).unwrap().trim().to_string()
    }
}

pub trait AssertExt {
    fn passes(self) -> Assert;
    fn fails(self) -> Assert;
}

impl AssertExt for &mut Command {
    fn passes(self) -> Assert {
        self.assert().success()
    }

    fn fails(self) -> Assert {
        self.assert().failure()
    }
}

pub trait OutputExt {
    fn stdout_has(self, needle: &str) -> Self;
    fn stderr_has(self, needle: &str) -> Self;
}

impl OutputExt for Assert {
    fn stdout_has(self, needle: &str) -> Self {
        self.stdout(predicate::str::contains(needle))
    }

    fn stderr_has(self, needle: &str) -> Self {
        self.stderr(predicate::str::contains(needle))
    }
}
