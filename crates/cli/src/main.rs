// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sj - Staged Jobs CLI

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod client;
mod commands;
mod jobs;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cancel, run, status, submit, summary, JobArgs};
use output::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::client::Client;

#[derive(Parser)]
#[command(
    name = "sj",
    version,
    about = "Staged Jobs - Resumable map/reduce in budgeted slices"
)]
struct Cli {
    /// Directory holding job state
    #[arg(long, global = true, default_value = ".sj")]
    state_dir: PathBuf,

    /// Output format
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job from a TOML configuration
    Submit(submit::SubmitArgs),
    /// Run one slice of a job, or every slice with --all
    Run(run::RunArgs),
    /// Show a job's status, or list all jobs
    Status(status::StatusArgs),
    /// Show the summary of a finished job
    Summary(JobArgs),
    /// Request cancellation of a job
    Cancel(JobArgs),
}

/// Log to stderr so stdout stays parseable; `SJ_LOG` takes an env-filter directive
fn setup_logging() {
    let filter = EnvFilter::try_from_env("SJ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();
    let client = Client::open(&cli.state_dir)?;
    let format = cli.output;

    match cli.command {
        Commands::Submit(args) => submit::handle(&client, args, format).await,
        Commands::Run(args) => run::handle(&client, args, format).await,
        Commands::Status(args) => status::handle(&client, args, format).await,
        Commands::Summary(args) => summary::handle(&client, args, format).await,
        Commands::Cancel(args) => cancel::handle(&client, args, format).await,
    }
}
