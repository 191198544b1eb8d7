//! The core optimization pipeline: statistics → classification → constraints
//! → decision records.
//!
//! Batch runs isolate per-SKU `DomainError`s as failure entries so one
//! degenerate profile never sinks the batch, and process SKUs in sequential
//! chunks with incremental progress (no internal fan-out).

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use replan_constraints::{
    AdmissionCandidate, AdmissionOutcome, ConstraintBudget, apply_order_constraints, run_admission,
};
use replan_core::{
    AdjustmentKind, ConstraintAdjustment, DecisionRecord, DemandHistory, DomainError, DomainResult,
    SkuId, SkuProfile,
};
use replan_model::{AbcClassification, classify, derive_risk_flags, plan_sku};

use crate::progress::ProgressSink;

/// Orders per naive replenishment cycle used for the holding-saved baseline
/// (monthly ad hoc ordering).
const NAIVE_ORDERS_PER_YEAR: f64 = 12.0;

/// SKUs processed per sequential chunk in batch runs.
const BATCH_CHUNK_SIZE: usize = 25;

/// Per-call knobs for the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Force a service level instead of deriving it from the ABC class.
    pub service_level_override: Option<f64>,
    /// Investment admission budget for the batch, if any.
    pub investment_budget: Option<ConstraintBudget>,
    /// Shared-capacity admission budget for the batch, if any.
    pub capacity_budget: Option<ConstraintBudget>,
}

/// A SKU that could not be optimized, isolated from the rest of the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuFailure {
    pub sku_id: SkuId,
    pub error: DomainError,
}

/// Rollup for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub total_skus: usize,
    pub optimized: usize,
    pub failed: usize,
    pub deferred: usize,
    pub total_investment: f64,
    pub total_annual_holding_cost: f64,
    pub average_stockout_risk: f64,
    pub created_at: DateTime<Utc>,
}

/// Output of one batch optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub records: Vec<DecisionRecord>,
    pub failures: Vec<SkuFailure>,
    pub classification: AbcClassification,
    pub summary: OptimizationSummary,
}

/// Optimize a single SKU at an explicit service level.
///
/// Raw recommendation is the EOQ; MOQ/lot rounding applies on top, in that
/// order. The order date walks current inventory down to the reorder point at
/// the mean daily demand rate.
pub fn optimize_sku(
    profile: &SkuProfile,
    history: Option<&DemandHistory>,
    service_level: f64,
    today: NaiveDate,
) -> DomainResult<DecisionRecord> {
    let plan = plan_sku(profile, service_level)?;

    let rounded =
        apply_order_constraints(plan.eoq, profile.moq, profile.lot_size, profile.unit_cost);

    let mut adjustments = rounded.adjustments;
    let quantity = rounded.quantity;
    let risk_flags = derive_risk_flags(profile, history, &plan);

    let mut record = DecisionRecord {
        profile: profile.clone(),
        service_level: plan.service_level,
        service_level_fallback: plan.service_level_fallback,
        abc_class: None,
        eoq: plan.eoq,
        demand_mean_lead_time: plan.lead_time_demand.mean,
        demand_std_dev_lead_time: plan.lead_time_demand.std_dev,
        z_score: plan.z_score,
        safety_stock: plan.safety_stock,
        reorder_point: plan.reorder_point,
        recommended_quantity: quantity,
        recommended_order_date: recommended_order_date(profile, plan.reorder_point, today),
        stockout_risk: plan.stockout_risk,
        annual_holding_cost: plan.annual_holding_cost,
        investment: quantity * profile.unit_cost,
        adjustments: Vec::new(),
        risk_flags,
        created_at: Utc::now(),
    };
    record.adjustments.append(&mut adjustments);

    debug!(
        sku = %profile.id,
        qty = record.recommended_quantity,
        rop = record.reorder_point,
        "sku optimized"
    );
    Ok(record)
}

/// When to place the order: today if already at/below the reorder point,
/// otherwise when mean demand burns inventory down to it.
fn recommended_order_date(profile: &SkuProfile, reorder_point: f64, today: NaiveDate) -> NaiveDate {
    let surplus = profile.current_inventory - reorder_point;
    if surplus <= 0.0 || profile.daily_demand_mean <= 0.0 {
        return today;
    }
    let days = (surplus / profile.daily_demand_mean).floor() as u64;
    today + Days::new(days)
}

/// Annual cost saving of ordering at EOQ instead of naive monthly lots;
/// feeds the admission priority.
fn holding_cost_saved(profile: &SkuProfile, eoq: f64) -> f64 {
    let h = profile.holding_cost_rate * profile.unit_cost;
    if eoq <= 0.0 || profile.annual_demand <= 0.0 {
        return 0.0;
    }
    let cycle_cost = |q: f64| q / 2.0 * h + profile.annual_demand / q * profile.ordering_cost;
    let naive_q = profile.annual_demand / NAIVE_ORDERS_PER_YEAR;
    if naive_q <= 0.0 {
        return 0.0;
    }
    (cycle_cost(naive_q) - cycle_cost(eoq)).max(0.0)
}

/// Expected stockout cost the order avoids: risk reduction from carrying
/// safety stock, priced at lead-time demand value.
fn stockout_cost_avoided(record: &DecisionRecord) -> f64 {
    let unprotected_risk = 0.5; // risk when ROP = mean lead-time demand
    let avoided = (unprotected_risk - record.stockout_risk).max(0.0);
    avoided * record.demand_mean_lead_time * record.profile.unit_price
}

/// Run the full batch pipeline: classify, optimize per SKU in chunks, then
/// admit against the configured budgets.
pub fn optimize_batch(
    profiles: &[SkuProfile],
    histories: &BTreeMap<SkuId, DemandHistory>,
    config: OptimizationConfig,
    today: NaiveDate,
    progress: &dyn ProgressSink,
) -> BatchOutcome {
    progress.report("classify", 5, "ranking SKUs by annual revenue");
    let classification = classify(profiles);

    let mut records = Vec::new();
    let mut failures = Vec::new();

    let total = profiles.len().max(1);
    for (chunk_idx, chunk) in profiles.chunks(BATCH_CHUNK_SIZE).enumerate() {
        for profile in chunk {
            let class = classification.class_of(&profile.id);
            let service_level = config
                .service_level_override
                .or(class.map(|c| c.service_level()))
                .unwrap_or(0.95);

            match optimize_sku(profile, histories.get(&profile.id), service_level, today) {
                Ok(mut record) => {
                    record.abc_class = class;
                    records.push(record);
                }
                Err(error) => failures.push(SkuFailure {
                    sku_id: profile.id.clone(),
                    error,
                }),
            }
        }

        let done = ((chunk_idx + 1) * BATCH_CHUNK_SIZE).min(profiles.len());
        // Chunk progress spans 10..=70.
        let percent = 10 + (done * 60 / total) as u8;
        progress.report(
            "optimize",
            percent,
            &format!("optimized {done}/{} SKUs", profiles.len()),
        );
    }

    if let Some(mut investment_budget) = config.investment_budget {
        progress.report("admission", 80, "running budget admission control");
        let mut capacity_budget = config.capacity_budget;
        apply_admission(&mut records, &mut investment_budget, capacity_budget.as_mut());
    }

    progress.report("summarize", 95, "building optimization summary");
    let summary = summarize(&records, &failures);
    info!(
        skus = summary.total_skus,
        optimized = summary.optimized,
        failed = summary.failed,
        deferred = summary.deferred,
        "batch optimization complete"
    );

    BatchOutcome {
        records,
        failures,
        classification,
        summary,
    }
}

/// Run admission over the drafted records and rewrite deferred ones in place.
fn apply_admission(
    records: &mut [DecisionRecord],
    investment_budget: &mut ConstraintBudget,
    capacity_budget: Option<&mut ConstraintBudget>,
) {
    let candidates: Vec<AdmissionCandidate> = records
        .iter()
        .filter(|r| r.recommended_quantity > 0.0)
        .map(|r| AdmissionCandidate {
            sku_id: r.profile.id.clone(),
            quantity: r.recommended_quantity,
            investment: r.investment,
            capacity_units: r.recommended_quantity,
            holding_cost_saved: holding_cost_saved(&r.profile, r.eoq),
            stockout_cost_avoided: stockout_cost_avoided(r),
        })
        .collect();

    // Admission only errors on consumption past a pre-checked ceiling, which
    // positive-cost records cannot trigger. Surface it loudly if it ever
    // happens rather than shipping a plan the budget never gated.
    let result = match run_admission(candidates, investment_budget, capacity_budget) {
        Ok(result) => result,
        Err(error) => {
            warn!(%error, "admission control failed; batch records left ungated");
            return;
        }
    };

    for outcome in &result.outcomes {
        if let AdmissionOutcome::Deferred(deferred) = outcome {
            if let Some(record) = records
                .iter_mut()
                .find(|r| r.profile.id == deferred.candidate.sku_id)
            {
                record.adjustments.push(ConstraintAdjustment {
                    kind: AdjustmentKind::BudgetDeferral,
                    quantity_before: record.recommended_quantity,
                    quantity_after: 0.0,
                    cost_impact: -record.investment,
                    note: format!(
                        "deferred: '{}' budget exhausted (estimated risk increase {:.0})",
                        deferred.violated_constraint, deferred.estimated_risk_increase
                    ),
                });
                record.recommended_quantity = 0.0;
                record.investment = 0.0;
            }
        }
    }
}

fn summarize(records: &[DecisionRecord], failures: &[SkuFailure]) -> OptimizationSummary {
    let deferred = records.iter().filter(|r| r.is_deferred()).count();
    let optimized = records.len();
    let risk_sum: f64 = records.iter().map(|r| r.stockout_risk).sum();

    OptimizationSummary {
        total_skus: optimized + failures.len(),
        optimized,
        failed: failures.len(),
        deferred,
        total_investment: records.iter().map(|r| r.investment).sum(),
        total_annual_holding_cost: records.iter().map(|r| r.annual_holding_cost).sum(),
        average_stockout_risk: if optimized > 0 {
            risk_sum / optimized as f64
        } else {
            0.0
        },
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use crate::progress::test_support::RecordingProgress;
    use replan_core::ChannelType;

    fn profile(id: &str, annual_demand: f64, unit_cost: f64) -> SkuProfile {
        SkuProfile {
            id: SkuId::new(id),
            annual_demand,
            daily_demand_mean: annual_demand / 365.0,
            daily_demand_std_dev: 2.0,
            lead_time_days: 14.0,
            lead_time_std_dev: 0.0,
            unit_cost,
            unit_price: unit_cost * 2.5,
            holding_cost_rate: 0.25,
            ordering_cost: 50.0,
            moq: None,
            lot_size: None,
            current_inventory: 200.0,
            channel: ChannelType::Ecommerce,
            category: "general".to_string(),
        }
    }

    fn today() -> NaiveDate {
        "2025-06-01".parse().unwrap()
    }

    #[test]
    fn single_sku_pipeline_produces_scenario_a_numbers() {
        let p = profile("SKU-A", 3650.0, 10.0);
        let record = optimize_sku(&p, None, 0.95, today()).unwrap();

        assert!((record.eoq - 382.1).abs() < 0.1);
        assert!((record.safety_stock - 12.31).abs() < 0.05);
        assert!((record.reorder_point - 152.3).abs() < 0.1);
        assert_eq!(record.recommended_quantity, record.eoq);
        assert!(record.adjustments.is_empty());
    }

    #[test]
    fn scenario_b_moq_shows_up_as_one_adjustment() {
        let mut p = profile("SKU-B", 3650.0, 10.0);
        p.moq = Some(500.0);
        let record = optimize_sku(&p, None, 0.95, today()).unwrap();

        assert_eq!(record.recommended_quantity, 500.0);
        assert_eq!(record.adjustments.len(), 1);
        assert_eq!(record.adjustments[0].kind, AdjustmentKind::MoqConstraint);
        assert_eq!(record.investment, 5_000.0);
    }

    #[test]
    fn order_date_burns_down_surplus_inventory() {
        let mut p = profile("SKU-C", 3650.0, 10.0);
        p.daily_demand_mean = 10.0;
        p.current_inventory = 252.3; // ~100 units above the ~152.3 ROP
        let record = optimize_sku(&p, None, 0.95, today()).unwrap();

        assert_eq!(record.recommended_order_date, today() + Days::new(9));
    }

    #[test]
    fn at_or_below_rop_means_order_today() {
        let mut p = profile("SKU-C", 3650.0, 10.0);
        p.current_inventory = 100.0;
        let record = optimize_sku(&p, None, 0.95, today()).unwrap();
        assert_eq!(record.recommended_order_date, today());
    }

    #[test]
    fn batch_isolates_bad_skus() {
        let good = profile("SKU-1", 3650.0, 10.0);
        let mut bad = profile("SKU-2", 3650.0, 10.0);
        bad.holding_cost_rate = 0.0; // degenerate EOQ denominator

        let outcome = optimize_batch(
            &[good, bad],
            &BTreeMap::new(),
            OptimizationConfig::default(),
            today(),
            &NullProgress,
        );

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].sku_id, SkuId::new("SKU-2"));
        assert_eq!(outcome.summary.total_skus, 2);
    }

    #[test]
    fn batch_uses_abc_service_levels() {
        // SKU-1 dominates revenue -> class A -> 0.99.
        let big = profile("SKU-1", 100_000.0, 10.0);
        let small = profile("SKU-2", 100.0, 10.0);

        let outcome = optimize_batch(
            &[big, small],
            &BTreeMap::new(),
            OptimizationConfig::default(),
            today(),
            &NullProgress,
        );

        let r1 = outcome
            .records
            .iter()
            .find(|r| r.profile.id == SkuId::new("SKU-1"))
            .unwrap();
        assert_eq!(r1.service_level, 0.99);
        assert_eq!(r1.abc_class, Some(replan_core::AbcClass::A));
    }

    #[test]
    fn budget_admission_defers_and_tags_records() {
        let profiles: Vec<SkuProfile> = (1..=4)
            .map(|i| profile(&format!("SKU-{i}"), 3650.0, 10.0))
            .collect();
        // Each order is ~3.8k; a 8k ceiling admits two.
        let config = OptimizationConfig {
            investment_budget: Some(ConstraintBudget::new("working_capital", 8_000.0)),
            ..Default::default()
        };

        let outcome = optimize_batch(
            &profiles,
            &BTreeMap::new(),
            config,
            today(),
            &NullProgress,
        );

        assert_eq!(outcome.summary.deferred, 2);
        assert!(outcome.summary.total_investment <= 8_000.0);
        let deferred: Vec<&DecisionRecord> =
            outcome.records.iter().filter(|r| r.is_deferred()).collect();
        assert_eq!(deferred.len(), 2);
        for r in deferred {
            assert_eq!(r.recommended_quantity, 0.0);
            assert!(r.adjustments.iter().any(|a| {
                a.kind == AdjustmentKind::BudgetDeferral && a.note.contains("working_capital")
            }));
        }
    }

    #[test]
    fn batch_progress_is_monotone() {
        let profiles: Vec<SkuProfile> = (0..60)
            .map(|i| profile(&format!("SKU-{i:03}"), 1000.0 + i as f64, 10.0))
            .collect();
        let progress = RecordingProgress::default();

        optimize_batch(
            &profiles,
            &BTreeMap::new(),
            OptimizationConfig::default(),
            today(),
            &progress,
        );

        let reports = progress.reports.lock().unwrap();
        assert!(reports.len() >= 3);
        for pair in reports.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "progress went backwards: {pair:?}");
        }
    }
}
