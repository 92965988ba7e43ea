// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj cancel <job>` - Request cancellation

use super::JobArgs;
use crate::client::Client;
use crate::output::{print, OutputFormat, StatusView};
use anyhow::Result;
use sj_core::JobId;

pub async fn handle(client: &Client, args: JobArgs, format: OutputFormat) -> Result<()> {
    let report = client.engine.cancel(&JobId::from(args.job_id)).await?;
    print(&StatusView(report), format);
    Ok(())
}
