// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local engine over a state directory

use crate::jobs;
use anyhow::{Context, Result};
use sj_core::{StatusReport, SystemClock, TracingGovernance, UuidIdGen};
use sj_engine::{Engine, EngineConfig, EngineDeps};
use sj_storage::{FileRecordSource, FileStateStore};
use std::path::{Path, PathBuf};

/// Optional engine settings file inside the state directory
pub const ENGINE_CONFIG_FILE: &str = "engine.toml";

pub type LocalEngine =
    Engine<FileRecordSource, FileStateStore, TracingGovernance, SystemClock, UuidIdGen>;

/// Engine plus the store it was opened on
pub struct Client {
    pub engine: LocalEngine,
    store: FileStateStore,
}

impl Client {
    pub fn open(state_dir: &Path) -> Result<Self> {
        let store = FileStateStore::open(state_dir)
            .with_context(|| format!("cannot open state directory {}", state_dir.display()))?;
        let config = load_engine_config(state_dir)?;
        let deps = EngineDeps {
            source: FileRecordSource::new(),
            store: store.clone(),
            governance: TracingGovernance,
        };
        let engine = Engine::new(deps, config, jobs::registry(), SystemClock, UuidIdGen);
        Ok(Self { engine, store })
    }

    /// Every job in the store with its current status
    pub async fn list(&self) -> Result<Vec<StatusReport>> {
        let mut reports = vec![];
        for id in self.store.job_ids()? {
            reports.push(self.engine.check_status(&id).await?);
        }
        Ok(reports)
    }
}

fn load_engine_config(state_dir: &Path) -> Result<EngineConfig> {
    let path = state_dir.join(ENGINE_CONFIG_FILE);
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let text = std::fs::read_to_string(&path)?;
    toml::from_str(&text).with_context(|| format!("invalid engine config {}", path.display()))
}

/// Resolve a relative path against `base` so later runs work from any directory
pub fn anchor(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
