//! The decision record, an append-only audit trail of one replenishment
//! decision.
//!
//! A record snapshots its inputs, intermediates and outputs at creation time
//! and is never mutated afterwards. Diagnostics, reporting and export all read
//! from it; none of them write back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sku::SkuProfile;

/// Revenue tier assigned by ABC classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    /// Target service level for the tier.
    pub fn service_level(&self) -> f64 {
        match self {
            AbcClass::A => 0.99,
            AbcClass::B => 0.98,
            AbcClass::C => 0.95,
        }
    }
}

/// Risk flags derived from demand history and the statistical outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    /// Coefficient of variation of historic demand above threshold.
    HighVolatility,
    /// A large share of historic periods had zero demand.
    IntermittentDemand,
    /// Recent demand running well above the earlier baseline.
    TrendingUp,
    /// Recent demand running well below the earlier baseline.
    TrendingDown,
    /// Residual stockout risk above the tolerated band despite safety stock.
    HighStockoutRisk,
    /// Lead time long enough that forecast error compounds.
    LongLeadTime,
}

/// What kind of constraint altered a recommended quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    MoqConstraint,
    LotSizeConstraint,
    BudgetDeferral,
    CapacityDeferral,
    CashFlowDeferral,
}

/// One constraint-driven change to an order quantity, in application order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintAdjustment {
    pub kind: AdjustmentKind,
    pub quantity_before: f64,
    pub quantity_after: f64,
    /// Signed change in order investment caused by the adjustment.
    pub cost_impact: f64,
    /// Human-readable detail, e.g. the name of the exhausted budget pool.
    pub note: String,
}

/// Append-only record of one replenishment decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Input snapshot the decision was computed from.
    pub profile: SkuProfile,
    /// Service level actually used (after any fallback).
    pub service_level: f64,
    /// True when the requested service level was unrecognized and the 0.95
    /// quantile was substituted. Never silent.
    pub service_level_fallback: bool,
    pub abc_class: Option<AbcClass>,

    // Statistical intermediates.
    pub eoq: f64,
    pub demand_mean_lead_time: f64,
    pub demand_std_dev_lead_time: f64,
    pub z_score: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,

    // Outputs.
    /// Final order quantity after all constraint adjustments. Zero means the
    /// order was deferred.
    pub recommended_quantity: f64,
    /// Suggested order placement date given current inventory burn-down.
    pub recommended_order_date: NaiveDate,
    /// Probability of stockout during lead time at the reorder point, [0, 1].
    pub stockout_risk: f64,
    /// Projected annual holding cost of carrying cycle + safety stock.
    pub annual_holding_cost: f64,
    /// Cash required to place the order at the recommended quantity.
    pub investment: f64,

    /// Constraint adjustments in the order they were applied.
    pub adjustments: Vec<ConstraintAdjustment>,
    pub risk_flags: Vec<RiskFlag>,
    pub created_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// True when a constraint forced the order to be deferred entirely.
    pub fn is_deferred(&self) -> bool {
        self.recommended_quantity == 0.0
            && self.adjustments.iter().any(|a| {
                matches!(
                    a.kind,
                    AdjustmentKind::BudgetDeferral
                        | AdjustmentKind::CapacityDeferral
                        | AdjustmentKind::CashFlowDeferral
                )
            })
    }
}
