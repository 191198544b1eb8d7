//! Named constraint budgets (working capital, supplier capacity).
//!
//! A budget is consumed additively over one planning period and reset for the
//! next. Admission checks against `ceiling × utilization_target`; the hard
//! ceiling itself is an invariant that `consume` refuses to break.

use serde::{Deserialize, Serialize};

use replan_core::{DomainError, DomainResult};

/// Comparison slack for cumulative float sums.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintBudget {
    /// Pool name, quoted verbatim in deferral diagnostics
    /// (e.g. `"working_capital"`).
    pub name: String,
    /// Hard upper bound for the pool.
    pub ceiling: f64,
    /// Fraction of the ceiling admission is allowed to plan against, (0, 1].
    pub utilization_target: f64,
    consumed: f64,
}

impl ConstraintBudget {
    pub fn new(name: impl Into<String>, ceiling: f64) -> Self {
        Self {
            name: name.into(),
            ceiling,
            utilization_target: 1.0,
            consumed: 0.0,
        }
    }

    pub fn with_target(mut self, utilization_target: f64) -> Self {
        self.utilization_target = utilization_target.clamp(0.0, 1.0);
        self
    }

    /// Amount admission may plan against.
    pub fn target_amount(&self) -> f64 {
        self.ceiling * self.utilization_target
    }

    pub fn consumed(&self) -> f64 {
        self.consumed
    }

    pub fn headroom(&self) -> f64 {
        (self.target_amount() - self.consumed).max(0.0)
    }

    /// Fraction of the ceiling currently consumed.
    pub fn utilization(&self) -> f64 {
        if self.ceiling > 0.0 {
            self.consumed / self.ceiling
        } else {
            0.0
        }
    }

    /// Would `amount` fit within the target?
    pub fn can_admit(&self, amount: f64) -> bool {
        self.consumed + amount <= self.target_amount() + EPSILON
    }

    /// Consume `amount` from the pool.
    ///
    /// Errors rather than breach the hard ceiling; callers are expected to
    /// have checked `can_admit` first.
    pub fn consume(&mut self, amount: f64) -> DomainResult<()> {
        if amount < 0.0 {
            return Err(DomainError::validation("budget consumption must be >= 0"));
        }
        if self.consumed + amount > self.ceiling + EPSILON {
            return Err(DomainError::invariant(format!(
                "budget '{}' ceiling exceeded",
                self.name
            )));
        }
        self.consumed += amount;
        Ok(())
    }

    /// Reset consumption for a new planning period.
    pub fn reset(&mut self) {
        self.consumed = 0.0;
    }
}
