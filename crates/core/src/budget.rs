// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution budget for one slice
//!
//! The budget is cooperative: stage runners poll [`ExecutionBudget::should_yield`]
//! between work items and never interrupt an item in flight. Units used past
//! the ceiling become the next slice's starting usage.

use crate::adapters::Governance;
use crate::clock::Clock;
use crate::config::BudgetPolicy;
use std::time::{Duration, Instant};

/// Tracks elapsed time and usage units for the current slice
pub struct ExecutionBudget<C: Clock, G: Governance> {
    policy: BudgetPolicy,
    clock: C,
    governance: G,
    started: Instant,
    used: u64,
}

impl<C: Clock, G: Governance> ExecutionBudget<C, G> {
    /// Start a slice, seeded with the previous slice's overrun
    ///
    /// The seed is capped one unit below the ceiling so every slice can
    /// start at least one item.
    pub fn new(policy: BudgetPolicy, clock: C, governance: G, carryover: u64) -> Self {
        let started = clock.now();
        let used = carryover.min(policy.max_units.saturating_sub(1));
        Self {
            policy,
            clock,
            governance,
            started,
            used,
        }
    }

    pub fn policy(&self) -> &BudgetPolicy {
        &self.policy
    }

    /// True once either ceiling is reached
    pub fn should_yield(&self) -> bool {
        self.used >= self.policy.max_units || self.elapsed() >= self.policy.max_elapsed
    }

    /// Charge units to this slice and report them to governance
    pub fn record_usage(&mut self, units: u64) {
        if units == 0 {
            return;
        }
        self.used = self.used.saturating_add(units);
        self.governance.charge_units(units);
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Units used this slice, including the carried-over seed
    pub fn used_units(&self) -> u64 {
        self.used
    }

    /// Units used past the ceiling, owed by the next slice
    pub fn overrun(&self) -> u64 {
        self.used.saturating_sub(self.policy.max_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FakeGovernance;
    use crate::clock::FakeClock;
    use yare::parameterized;

    type TestBudget = ExecutionBudget<FakeClock, FakeGovernance>;

    fn budget(max_units: u64, carryover: u64) -> (TestBudget, FakeClock, FakeGovernance) {
        let clock = FakeClock::new();
        let governance = FakeGovernance::new();
        let policy = BudgetPolicy::new(Duration::from_secs(60), max_units);
        let budget = ExecutionBudget::new(policy, clock.clone(), governance.clone(), carryover);
        (budget, clock, governance)
    }

    #[test]
    fn yields_once_units_reach_ceiling() {
        let (mut budget, _, governance) = budget(10, 0);
        budget.record_usage(9);
        assert!(!budget.should_yield());
        budget.record_usage(1);
        assert!(budget.should_yield());
        assert_eq!(governance.total(), 10);
    }

    #[test]
    fn yields_once_elapsed_reaches_ceiling() {
        let (budget, clock, _) = budget(10, 0);
        clock.advance(Duration::from_secs(59));
        assert!(!budget.should_yield());
        clock.advance(Duration::from_secs(1));
        assert!(budget.should_yield());
        assert_eq!(budget.elapsed_seconds(), 60.0);
    }

    #[test]
    fn overrun_is_what_exceeds_the_ceiling() {
        let (mut budget, _, _) = budget(10, 0);
        budget.record_usage(1);
        budget.record_usage(11);
        assert_eq!(budget.used_units(), 12);
        assert_eq!(budget.overrun(), 2);
    }

    #[parameterized(
        small = { 3, 3 },
        at_ceiling = { 10, 9 },
        huge = { 1_000, 9 },
    )]
    fn carryover_is_capped_below_ceiling(carryover: u64, expected: u64) {
        let (budget, _, governance) = budget(10, carryover);
        assert_eq!(budget.used_units(), expected);
        assert!(!budget.should_yield());
        assert_eq!(governance.total(), 0);
    }

    #[test]
    fn zero_charges_are_not_reported() {
        let (mut budget, _, governance) = budget(10, 0);
        budget.record_usage(0);
        assert_eq!(governance.calls(), 0);
    }
}
