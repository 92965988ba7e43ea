// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work items flowing through the MAP and REDUCE stages
//!
//! An item's state only moves `Pending → {Failed, Complete}`. A failed item
//! with attempts left goes back to `Pending` for its next attempt; once the
//! attempt ceiling is reached it stays `Failed` for good.

use crate::input::Record;
use crate::shuffle::KeyGroup;
use serde::{Deserialize, Serialize};

/// Per-item completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Pending,
    Failed,
    Complete,
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemState::Pending => "PENDING",
            ItemState::Failed => "FAILED",
            ItemState::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

/// What happens to an item after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Attempts remain; the item goes back on the queue
    Retry,
    /// The attempt ceiling was reached
    Exhausted,
}

/// One key-scoped unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Position in the stage's item list; orders spooled output
    pub ordinal: u64,
    pub key: String,
    /// One value for MAP items, the grouped values for REDUCE items
    pub values: Vec<String>,
    pub attempts: u32,
    pub max_attempts: u32,
    pub state: ItemState,
}

impl WorkItem {
    pub fn for_map(ordinal: u64, record: Record, max_attempts: u32) -> Self {
        Self {
            ordinal,
            key: record.key,
            values: vec![record.value],
            attempts: 0,
            max_attempts,
            state: ItemState::Pending,
        }
    }

    pub fn for_reduce(ordinal: u64, group: KeyGroup, max_attempts: u32) -> Self {
        Self {
            ordinal,
            key: group.key,
            values: group.values,
            attempts: 0,
            max_attempts,
            state: ItemState::Pending,
        }
    }

    /// 1-based number of the attempt about to run
    pub fn execution_no(&self) -> u32 {
        self.attempts + 1
    }

    pub fn is_terminal(&self) -> bool {
        self.state != ItemState::Pending
    }

    pub fn record_success(&mut self) {
        self.attempts += 1;
        self.state = ItemState::Complete;
    }

    pub fn record_failure(&mut self) -> FailureDisposition {
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.state = ItemState::Failed;
            FailureDisposition::Exhausted
        } else {
            self.state = ItemState::Pending;
            FailureDisposition::Retry
        }
    }
}
