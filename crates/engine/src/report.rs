//! CFO-level rollup across a batch optimization and an optional
//! working-capital analysis. Plain structured data; rendering/export is out
//! of scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use replan_model::ClassSummary;
use replan_treasury::WorkingCapitalKpis;

use crate::optimizer::BatchOutcome;
use crate::working_capital::WorkingCapitalAnalysis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfoReport {
    pub generated_at: DateTime<Utc>,
    pub sku_count: usize,
    pub optimized: usize,
    pub failed: usize,
    pub deferred_orders: usize,
    /// Cash committed by the admitted plan.
    pub total_investment: f64,
    pub total_annual_holding_cost: f64,
    pub average_stockout_risk: f64,
    pub class_a: ClassSummary,
    pub class_b: ClassSummary,
    pub class_c: ClassSummary,
    /// Present when a working-capital analysis was part of the run.
    pub working_capital: Option<WorkingCapitalKpis>,
}

/// Assemble the report from pipeline outputs.
pub fn cfo_report(batch: &BatchOutcome, wc: Option<&WorkingCapitalAnalysis>) -> CfoReport {
    CfoReport {
        generated_at: Utc::now(),
        sku_count: batch.summary.total_skus,
        optimized: batch.summary.optimized,
        failed: batch.summary.failed,
        deferred_orders: batch.summary.deferred,
        total_investment: batch.summary.total_investment,
        total_annual_holding_cost: batch.summary.total_annual_holding_cost,
        average_stockout_risk: batch.summary.average_stockout_risk,
        class_a: batch.classification.class_a.clone(),
        class_b: batch.classification.class_b.clone(),
        class_c: batch.classification.class_c.clone(),
        working_capital: wc.map(|a| a.effective_kpis()),
    }
}
