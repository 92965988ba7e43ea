// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cancel;
pub mod run;
pub mod status;
pub mod submit;
pub mod summary;

use clap::Args;

/// Arguments naming a single job
#[derive(Args)]
pub struct JobArgs {
    /// Job id printed by `sj submit`
    pub job_id: String,
}
