// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job configuration
//!
//! The attempt ceiling and the usage-unit cost model are policy knobs with
//! defaults rather than hard-coded limits.

use crate::input::InputSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the worker pool size for a single job
pub const MAX_CONCURRENCY: usize = 64;

/// Errors from validating a job configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("definition name is empty")]
    MissingDefinition,
    #[error("unknown job definition: {0}")]
    UnknownDefinition(String),
    #[error("definition {0} has neither a map nor a reduce function")]
    EmptyDefinition(String),
    #[error("concurrency must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    Concurrency(usize),
    #[error("max_attempts must be at least 1")]
    MaxAttempts,
    #[error("budget max_units must be at least 1")]
    BudgetUnits,
    #[error("budget max_elapsed must be non-zero")]
    BudgetElapsed,
    #[error("invalid input: {0}")]
    Input(String),
    #[error("invalid job configuration: {0}")]
    Parse(String),
}

fn default_concurrency() -> usize {
    1
}

fn default_max_attempts() -> u32 {
    3
}

/// A submitted job's configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Name of the registered job definition supplying the user functions
    pub definition: String,
    pub input: InputSource,
    #[serde(default)]
    pub budget: BudgetPolicy,
    /// Maximum number of work items in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Attempts allowed per work item before it is terminally failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl JobConfig {
    pub fn new(definition: impl Into<String>, input: InputSource) -> Self {
        Self {
            definition: definition.into(),
            input,
            budget: BudgetPolicy::default(),
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
        }
    }

    pub fn with_budget(self, budget: BudgetPolicy) -> Self {
        Self { budget, ..self }
    }

    pub fn with_concurrency(self, concurrency: usize) -> Self {
        Self {
            concurrency,
            ..self
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Parse a configuration from TOML
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check the configuration is usable, independent of the registry
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.definition.trim().is_empty() {
            return Err(ConfigError::MissingDefinition);
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Concurrency(self.concurrency));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::MaxAttempts);
        }
        self.budget.validate()?;
        self.input.validate().map_err(ConfigError::Input)
    }
}

/// Per-slice resource ceilings and the cost of each governed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPolicy {
    /// Elapsed-time ceiling for one execution slice
    #[serde(with = "humantime_serde", default = "default_max_elapsed")]
    pub max_elapsed: Duration,
    /// Usage-unit ceiling for one execution slice
    #[serde(default = "default_max_units")]
    pub max_units: u64,
    #[serde(default)]
    pub costs: UsageCosts,
}

fn default_max_elapsed() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_max_units() -> u64 {
    10_000
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            max_elapsed: default_max_elapsed(),
            max_units: default_max_units(),
            costs: UsageCosts::default(),
        }
    }
}

impl BudgetPolicy {
    pub fn new(max_elapsed: Duration, max_units: u64) -> Self {
        Self {
            max_elapsed,
            max_units,
            costs: UsageCosts::default(),
        }
    }

    pub fn with_costs(self, costs: UsageCosts) -> Self {
        Self { costs, ..self }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_units == 0 {
            return Err(ConfigError::BudgetUnits);
        }
        if self.max_elapsed.is_zero() {
            return Err(ConfigError::BudgetElapsed);
        }
        Ok(())
    }
}

/// Usage units charged per governed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageCosts {
    /// Per record read from the input source
    pub record_read: u64,
    /// Per map or reduce function invocation
    pub invocation: u64,
    /// Per key/value pair written by a user function
    pub write: u64,
}

impl Default for UsageCosts {
    fn default() -> Self {
        Self {
            record_read: 1,
            invocation: 5,
            write: 1,
        }
    }
}

impl UsageCosts {
    /// A cost model where only invocations are charged
    pub fn per_invocation(units: u64) -> Self {
        Self {
            record_read: 0,
            invocation: units,
            write: 0,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
