// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log shape of the effects a job transition produces

use crate::job::JobId;

/// An effect the executor logs under its own span
pub trait TracedEffect {
    /// Span tag, such as "emit" or "archive"
    fn name(&self) -> &'static str;

    /// Details worth a log line; empty for effects that carry none
    fn fields(&self) -> Vec<(&'static str, String)>;

    /// Span covering one execution of the effect for `job`
    fn span(&self, job: &JobId) -> tracing::Span {
        tracing::info_span!("effect", job_id = %job, effect = self.name())
    }

    /// One-line rendering: the name followed by `key=value` fields
    fn describe(&self) -> String {
        self.fields()
            .iter()
            .fold(self.name().to_string(), |mut line, (key, value)| {
                line.push_str(&format!(" {key}={value}"));
                line
            })
    }
}
