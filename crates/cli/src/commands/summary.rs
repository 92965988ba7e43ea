// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj summary <job>` - Show the summary of a finished job

use super::JobArgs;
use crate::client::Client;
use crate::output::{print, OutputFormat, SummaryView};
use anyhow::Result;
use sj_core::JobId;

pub async fn handle(client: &Client, args: JobArgs, format: OutputFormat) -> Result<()> {
    let summary = client.engine.get_summary(&JobId::from(args.job_id)).await?;
    print(&SummaryView(summary), format);
    Ok(())
}
