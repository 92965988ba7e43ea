// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sj execution engine
//!
//! Reads input through the partitioner, runs MAP and REDUCE on a bounded
//! worker pool, and drives jobs one budget-limited slice at a time.

mod engine;
mod error;
mod executor;
mod partitioner;
mod retry;
mod runner;
mod scheduler;

pub use engine::{Engine, EngineConfig, EngineDeps};
pub use error::EngineError;
pub use executor::Executor;
pub use partitioner::InputPartitioner;
pub use retry::{RetryPolicy, Transient};
pub use runner::{CancelFlag, StageProgress};
pub use scheduler::{Scheduler, SliceReport};
