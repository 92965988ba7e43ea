// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj status [job]` - Show one job, or list every job

use crate::client::Client;
use crate::output::{print, print_list, OutputFormat, StatusLine, StatusView};
use anyhow::Result;
use clap::Args;
use sj_core::JobId;

#[derive(Args)]
pub struct StatusArgs {
    /// Job id; lists all jobs when omitted
    pub job_id: Option<String>,
}

pub async fn handle(client: &Client, args: StatusArgs, format: OutputFormat) -> Result<()> {
    match args.job_id {
        Some(id) => {
            let report = client.engine.check_status(&JobId::from(id)).await?;
            print(&StatusView(report), format);
        }
        None => {
            let lines: Vec<StatusLine> = client.list().await?.into_iter().map(StatusLine).collect();
            if lines.is_empty() && matches!(format, OutputFormat::Text) {
                println!("No jobs");
            } else {
                print_list(&lines, format);
            }
        }
    }
    Ok(())
}
