// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sj submit <config.toml>` - Submit a job

use crate::client::{anchor, Client};
use crate::output::{print, OutputFormat, Submitted};
use anyhow::{Context, Result};
use clap::Args;
use sj_core::{InputSource, JobConfig};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct SubmitArgs {
    /// Job configuration file (TOML)
    pub config: PathBuf,
}

pub async fn handle(client: &Client, args: SubmitArgs, format: OutputFormat) -> Result<()> {
    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("cannot read {}", args.config.display()))?;
    let mut config = JobConfig::from_toml(&text)?;

    // Input paths are relative to the config file, not to later invocations
    let base = std::env::current_dir()?.join(args.config.parent().unwrap_or(Path::new("")));
    if let InputSource::File { path, .. } = &mut config.input {
        *path = anchor(path, &base);
    }

    let job_id = client.engine.submit(config).await?;
    let status = client.engine.check_status(&job_id).await?.status;
    print(&Submitted { job_id, status }, format);
    Ok(())
}
