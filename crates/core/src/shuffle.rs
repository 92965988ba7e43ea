// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spooled pairs and the shuffle grouping
//!
//! Every spooled pair records the ordinal of the work item that wrote it
//! (`origin`) and its index among that invocation's writes (`seq`). Sorting
//! by `(origin, seq)` recovers the order a sequential run would have
//! written in, whatever order the workers actually finished in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An append-only spool kept per job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    /// Pairs written by MAP when a REDUCE stage follows
    Intermediate,
    /// Final output pairs
    Output,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Stream::Intermediate => "intermediate",
            Stream::Output => "output",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A key/value pair in a spool, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpoolEntry {
    pub key: String,
    pub value: String,
    /// Ordinal of the work item (or input record) that wrote the pair
    pub origin: u64,
    /// Index of the pair among its invocation's writes
    pub seq: u64,
}

impl SpoolEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, origin: u64, seq: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            origin,
            seq,
        }
    }
}

/// All values written under one key, in write order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGroup {
    pub key: String,
    pub values: Vec<String>,
}

/// Sort entries into sequential write order
pub fn sort_entries(entries: &mut [SpoolEntry]) {
    entries.sort_by_key(|e| (e.origin, e.seq));
}

/// Group spooled pairs by key
///
/// Groups are ordered by each key's first appearance in write order, and
/// values within a group keep their write order. The result depends only on
/// the set of entries, not on the order they were appended.
pub fn group_by_key(entries: &[SpoolEntry]) -> Vec<KeyGroup> {
    let mut ordered: Vec<&SpoolEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| (e.origin, e.seq));

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<KeyGroup> = Vec::new();
    for entry in ordered {
        match index.get(entry.key.as_str()) {
            Some(&i) => groups[i].values.push(entry.value.clone()),
            None => {
                index.insert(entry.key.as_str(), groups.len());
                groups.push(KeyGroup {
                    key: entry.key.clone(),
                    values: vec![entry.value.clone()],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
#[path = "shuffle_tests.rs"]
mod tests;
