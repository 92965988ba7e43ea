// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj run <job> [--all]` - Run execution slices

use crate::client::Client;
use crate::output::{print_list, OutputFormat, SliceLine};
use anyhow::Result;
use clap::Args;
use sj_core::JobId;

#[derive(Args)]
pub struct RunArgs {
    /// Job id printed by `sj submit`
    pub job_id: String,

    /// Keep running slices until the job completes or fails
    #[arg(long)]
    pub all: bool,
}

pub async fn handle(client: &Client, args: RunArgs, format: OutputFormat) -> Result<()> {
    let id = JobId::from(args.job_id);
    let mut lines = vec![];
    loop {
        let report = client.engine.run_slice(&id).await?;
        lines.push(SliceLine::from(&report));
        if !args.all || report.stage.is_terminal() {
            break;
        }
    }
    print_list(&lines, format);
    Ok(())
}
