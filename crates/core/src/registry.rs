// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named job definitions
//!
//! Functions cannot be persisted with a job, so a job's configuration names
//! a definition and every slice looks it up again.

use crate::config::{ConfigError, JobConfig};
use crate::function::{Mapper, Reducer, Summarizer};
use crate::job::JobPlan;
use std::collections::HashMap;
use std::sync::Arc;

/// The user functions behind a job
#[derive(Clone, Default)]
pub struct JobDefinition {
    pub mapper: Option<Arc<dyn Mapper>>,
    pub reducer: Option<Arc<dyn Reducer>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl JobDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(self, mapper: impl Mapper) -> Self {
        Self {
            mapper: Some(Arc::new(mapper)),
            ..self
        }
    }

    pub fn with_reducer(self, reducer: impl Reducer) -> Self {
        Self {
            reducer: Some(Arc::new(reducer)),
            ..self
        }
    }

    pub fn with_summarizer(self, summarizer: impl Summarizer) -> Self {
        Self {
            summarizer: Some(Arc::new(summarizer)),
            ..self
        }
    }

    /// Which optional stages this definition runs
    pub fn plan(&self) -> JobPlan {
        JobPlan {
            map: self.mapper.is_some(),
            reduce: self.reducer.is_some(),
        }
    }
}

impl std::fmt::Debug for JobDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDefinition")
            .field("mapper", &self.mapper.is_some())
            .field("reducer", &self.reducer.is_some())
            .field("summarizer", &self.summarizer.is_some())
            .finish()
    }
}

/// Definitions available to the engine, by name
#[derive(Clone, Default, Debug)]
pub struct JobRegistry {
    definitions: HashMap<String, JobDefinition>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, name: impl Into<String>, definition: JobDefinition) -> Self {
        self.definitions.insert(name.into(), definition);
        self
    }

    pub fn get(&self, name: &str) -> Option<&JobDefinition> {
        self.definitions.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate a configuration and find its definition
    pub fn resolve(&self, config: &JobConfig) -> Result<&JobDefinition, ConfigError> {
        config.validate()?;
        let definition = self
            .get(&config.definition)
            .ok_or_else(|| ConfigError::UnknownDefinition(config.definition.clone()))?;
        let plan = definition.plan();
        if !plan.map && !plan.reduce {
            return Err(ConfigError::EmptyDefinition(config.definition.clone()));
        }
        Ok(definition)
    }
}
