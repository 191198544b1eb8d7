//! Priority-based budget admission control.
//!
//! Single-pass greedy: candidates are ranked by value density and admitted
//! while every budget keeps headroom. This is a knapsack approximation, not a
//! global optimum. Diagnostics and downstream reporting assume exactly this
//! ordering, so it must stay greedy.

use serde::{Deserialize, Serialize};

use replan_core::{DomainResult, SkuId};

use crate::budget::ConstraintBudget;

/// One order proposal competing for budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionCandidate {
    pub sku_id: SkuId,
    pub quantity: f64,
    /// Cash required to place the order.
    pub investment: f64,
    /// Units of shared capacity (warehouse/container) the order consumes.
    pub capacity_units: f64,
    /// Annual holding cost avoided by ordering at this quantity instead of
    /// ad hoc replenishment.
    pub holding_cost_saved: f64,
    /// Expected stockout cost avoided over the planning period.
    pub stockout_cost_avoided: f64,
}

impl AdmissionCandidate {
    /// Value density: benefit per unit of cash. Zero-investment candidates
    /// rank at 0 rather than dividing by zero.
    pub fn priority(&self) -> f64 {
        if self.investment > 0.0 {
            (self.holding_cost_saved + self.stockout_cost_avoided) / self.investment
        } else {
            0.0
        }
    }
}

/// A candidate pushed out of the current period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredOrder {
    pub candidate: AdmissionCandidate,
    /// Name of the budget pool that ran out of headroom.
    pub violated_constraint: String,
    /// Expected cost of the stockout exposure the deferral reopens.
    pub estimated_risk_increase: f64,
}

/// Per-candidate admission outcome. Deferral is a successful outcome carrying
/// diagnostics, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdmissionOutcome {
    Admitted(AdmissionCandidate),
    Deferred(DeferredOrder),
}

impl AdmissionOutcome {
    pub fn sku_id(&self) -> &SkuId {
        match self {
            AdmissionOutcome::Admitted(c) => &c.sku_id,
            AdmissionOutcome::Deferred(d) => &d.candidate.sku_id,
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted(_))
    }
}

/// Result of one admission pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionResult {
    /// Outcomes in evaluation (priority) order.
    pub outcomes: Vec<AdmissionOutcome>,
    pub admitted_investment: f64,
    pub admitted_capacity: f64,
}

impl AdmissionResult {
    pub fn admitted(&self) -> impl Iterator<Item = &AdmissionCandidate> {
        self.outcomes.iter().filter_map(|o| match o {
            AdmissionOutcome::Admitted(c) => Some(c),
            AdmissionOutcome::Deferred(_) => None,
        })
    }

    pub fn deferred(&self) -> impl Iterator<Item = &DeferredOrder> {
        self.outcomes.iter().filter_map(|o| match o {
            AdmissionOutcome::Deferred(d) => Some(d),
            AdmissionOutcome::Admitted(_) => None,
        })
    }
}

/// Run greedy admission over `candidates` against an investment budget and an
/// optional shared-capacity budget.
///
/// Candidates are sorted by priority descending (stable, so equal priorities
/// keep their input order) and admitted while *both* budgets can absorb them.
/// A rejection does not stop the pass: a later, smaller candidate may still
/// fit the remaining headroom.
pub fn run_admission(
    candidates: Vec<AdmissionCandidate>,
    investment_budget: &mut ConstraintBudget,
    mut capacity_budget: Option<&mut ConstraintBudget>,
) -> DomainResult<AdmissionResult> {
    let mut ranked = candidates;
    ranked.sort_by(|a, b| {
        b.priority()
            .partial_cmp(&a.priority())
            .unwrap_or(core::cmp::Ordering::Equal)
    });

    let mut outcomes = Vec::with_capacity(ranked.len());
    let mut admitted_investment = 0.0;
    let mut admitted_capacity = 0.0;

    for candidate in ranked {
        let violated = if !investment_budget.can_admit(candidate.investment) {
            Some(investment_budget.name.clone())
        } else {
            capacity_budget
                .as_ref()
                .filter(|b| !b.can_admit(candidate.capacity_units))
                .map(|b| b.name.clone())
        };

        match violated {
            None => {
                investment_budget.consume(candidate.investment)?;
                if let Some(capacity) = capacity_budget.as_deref_mut() {
                    capacity.consume(candidate.capacity_units)?;
                }
                admitted_investment += candidate.investment;
                admitted_capacity += candidate.capacity_units;
                outcomes.push(AdmissionOutcome::Admitted(candidate));
            }
            Some(constraint) => {
                let risk = candidate.stockout_cost_avoided;
                outcomes.push(AdmissionOutcome::Deferred(DeferredOrder {
                    candidate,
                    violated_constraint: constraint,
                    estimated_risk_increase: risk,
                }));
            }
        }
    }

    Ok(AdmissionResult {
        outcomes,
        admitted_investment,
        admitted_capacity,
    })
}
