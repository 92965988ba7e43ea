// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use sj_core::{JobId, JobStatus, JobSummary, PhaseSummary, StatusReport};
use sj_engine::SliceReport;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

fn elapsed(d: Duration) -> humantime::FormattedDuration {
    // Millisecond precision is plenty for a terminal
    humantime::format_duration(Duration::from_millis(d.as_millis() as u64))
}

#[derive(Serialize)]
pub struct Submitted {
    pub job_id: JobId,
    pub status: JobStatus,
}

impl fmt::Display for Submitted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.job_id)
    }
}

/// One slice's outcome
#[derive(Serialize)]
pub struct SliceLine {
    pub job_id: JobId,
    pub slice: u32,
    pub stage: String,
    pub status: JobStatus,
    pub yielded: bool,
    pub units_used: u64,
    pub elapsed_ms: u64,
}

impl From<&SliceReport> for SliceLine {
    fn from(report: &SliceReport) -> Self {
        Self {
            job_id: report.job_id.clone(),
            slice: report.slice,
            stage: report.stage.name().to_string(),
            status: report.status,
            yielded: report.yielded,
            units_used: report.units_used,
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}

impl fmt::Display for SliceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} slice {}: {} {} units={} elapsed={}",
            self.job_id,
            self.slice,
            self.stage,
            self.status,
            self.units_used,
            elapsed(Duration::from_millis(self.elapsed_ms))
        )?;
        if self.yielded {
            write!(f, " (yielded)")?;
        }
        Ok(())
    }
}

/// Full status report
#[derive(Serialize)]
#[serde(transparent)]
pub struct StatusView(pub StatusReport);

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        writeln!(f, "job       {}", s.job_id)?;
        writeln!(f, "stage     {}", s.stage)?;
        writeln!(f, "status    {}", s.status)?;
        writeln!(f, "progress  {:.1}%", s.percent_complete)?;
        writeln!(
            f,
            "map       {} of {} pending",
            s.counts.pending_map, s.counts.total_map
        )?;
        writeln!(
            f,
            "reduce    {} of {} pending",
            s.counts.pending_reduce, s.counts.total_reduce
        )?;
        write!(
            f,
            "output    {} pairs, {} not yet summarized",
            s.counts.total_output, s.counts.pending_output
        )?;
        if let Some(error) = &s.error {
            write!(f, "\nerror     {}", error)?;
        }
        Ok(())
    }
}

/// One line per job, for listings
#[derive(Serialize)]
#[serde(transparent)]
pub struct StatusLine(pub StatusReport);

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        write!(
            f,
            "{:<34} {:<10} {:<11} {:>5.1}%",
            s.job_id, s.stage, s.status, s.percent_complete
        )
    }
}

/// Archived job summary
#[derive(Serialize)]
#[serde(transparent)]
pub struct SummaryView(pub JobSummary);

fn phase_row(f: &mut fmt::Formatter<'_>, phase: &PhaseSummary) -> fmt::Result {
    writeln!(
        f,
        "{:<8} {:>10} {:>8} {:>11} {:>6}  {}",
        phase.phase,
        elapsed(phase.elapsed).to_string(),
        phase.usage,
        phase.concurrency,
        phase.yields,
        phase.error.as_deref().unwrap_or("-")
    )
}

impl fmt::Display for SummaryView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.0;
        writeln!(f, "job       {}", s.job_id)?;
        writeln!(f, "status    {}", s.status)?;
        writeln!(f, "created   {}", s.date_created.to_rfc3339())?;
        writeln!(f, "slices    {} ({} yields)", s.slices, s.yields)?;
        if let Some(error) = &s.summarize_error {
            writeln!(f, "summarize {}", error)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:<8} {:>10} {:>8} {:>11} {:>6}  ERROR",
            "PHASE", "ELAPSED", "USAGE", "CONCURRENCY", "YIELDS"
        )?;
        for phase in [&s.input, &s.map, &s.reduce] {
            phase_row(f, phase)?;
        }

        let errors: Vec<_> = [&s.map, &s.reduce]
            .into_iter()
            .flat_map(|p| p.errors().map(move |e| (p.phase, e)))
            .collect();
        if !errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "key errors:")?;
            for (phase, e) in errors {
                writeln!(f, "  {} {} attempt {}: {}", phase, e.key, e.attempt, e.error)?;
            }
        }

        writeln!(f)?;
        write!(f, "output ({} pairs):", s.output_len())?;
        for pair in s.output() {
            write!(f, "\n{}\t{}", pair.key, pair.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
