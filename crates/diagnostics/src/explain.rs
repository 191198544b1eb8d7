//! Decision diagnostics: everything a planner (or their CFO) needs to trust a
//! number they did not compute themselves.
//!
//! Works from a `&DecisionRecord` alone and never mutates it. What-if and
//! sensitivity figures re-run the statistical model on perturbed copies of the
//! recorded input snapshot.

use serde::{Deserialize, Serialize};

use replan_constraints::apply_order_constraints;
use replan_core::{AdjustmentKind, DecisionRecord, RiskFlag};
use replan_model::plan_sku;

/// Severity tier for a constraint impact or risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Cost-impact thresholds for severity tiers.
const SEVERITY_HIGH_COST: f64 = 5_000.0;
const SEVERITY_MEDIUM_COST: f64 = 1_000.0;

fn severity_for_cost(cost: f64) -> Severity {
    let cost = cost.abs();
    if cost >= SEVERITY_HIGH_COST {
        Severity::High
    } else if cost >= SEVERITY_MEDIUM_COST {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// One formula with its inputs and result, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaBreakdown {
    pub name: String,
    pub formula: String,
    pub parameters: Vec<(String, f64)>,
    pub result: f64,
}

/// One constraint adjustment, severity-tiered by cost impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintImpact {
    pub kind: AdjustmentKind,
    pub description: String,
    pub quantity_delta: f64,
    pub cost_impact: f64,
    pub severity: Severity,
}

/// One surfaced risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub description: String,
    pub severity: Severity,
}

/// An alternative the planner could choose instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhatIfScenario {
    pub label: String,
    pub quantity: f64,
    pub quantity_delta: f64,
    /// Estimated change in annual cost (holding + order investment where
    /// relevant) against the recorded decision.
    pub cost_delta: f64,
}

/// Which input a sensitivity entry perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityInput {
    Demand,
    LeadTime,
}

/// One row of the sensitivity grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityEntry {
    pub input: SensitivityInput,
    pub change: String,
    pub reorder_point: f64,
    pub reorder_point_delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub entries: Vec<SensitivityEntry>,
    /// Input whose worst-case perturbation moves the reorder point most.
    pub most_sensitive: SensitivityInput,
}

/// Sign-off tier required for the investment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalTier {
    Automatic,
    Manager,
    Director,
    Board,
}

const APPROVAL_MANAGER_FROM: f64 = 10_000.0;
const APPROVAL_DIRECTOR_FROM: f64 = 50_000.0;
const APPROVAL_BOARD_FROM: f64 = 250_000.0;

pub fn approval_tier(investment: f64) -> ApprovalTier {
    if investment >= APPROVAL_BOARD_FROM {
        ApprovalTier::Board
    } else if investment >= APPROVAL_DIRECTOR_FROM {
        ApprovalTier::Director
    } else if investment >= APPROVAL_MANAGER_FROM {
        ApprovalTier::Manager
    } else {
        ApprovalTier::Automatic
    }
}

/// The full derived explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionExplanation {
    pub summary: String,
    pub breakdowns: Vec<FormulaBreakdown>,
    pub constraint_impacts: Vec<ConstraintImpact>,
    pub risk_factors: Vec<RiskFactor>,
    pub what_if: Vec<WhatIfScenario>,
    pub sensitivity: SensitivityTable,
    pub approval_tier: ApprovalTier,
}

/// Derive the full explanation for one decision record.
pub fn explain(record: &DecisionRecord) -> DecisionExplanation {
    DecisionExplanation {
        summary: summary(record),
        breakdowns: breakdowns(record),
        constraint_impacts: constraint_impacts(record),
        risk_factors: risk_factors(record),
        what_if: what_if(record),
        sensitivity: sensitivity(record),
        approval_tier: approval_tier(record.investment),
    }
}

fn summary(record: &DecisionRecord) -> String {
    let p = &record.profile;
    let mut s = if record.is_deferred() {
        format!(
            "Order for {} deferred this period: every candidate quantity breached a constraint budget.",
            p.id
        )
    } else {
        format!(
            "Order {:.0} units of {} around {} to hold a {:.0}% service level.",
            record.recommended_quantity,
            p.id,
            record.recommended_order_date,
            record.service_level * 100.0
        )
    };
    s.push_str(&format!(
        " Reorder when inventory reaches {:.0} units; residual stockout risk {:.1}%.",
        record.reorder_point,
        record.stockout_risk * 100.0
    ));
    if record.service_level_fallback {
        s.push_str(" Requested service level was not recognized; the 0.95 tier was used.");
    }
    s
}

fn breakdowns(record: &DecisionRecord) -> Vec<FormulaBreakdown> {
    let p = &record.profile;
    vec![
        FormulaBreakdown {
            name: "EOQ".to_string(),
            formula: "sqrt(2 * annual_demand * ordering_cost / (holding_cost_rate * unit_cost))"
                .to_string(),
            parameters: vec![
                ("annual_demand".to_string(), p.annual_demand),
                ("ordering_cost".to_string(), p.ordering_cost),
                ("holding_cost_rate".to_string(), p.holding_cost_rate),
                ("unit_cost".to_string(), p.unit_cost),
            ],
            result: record.eoq,
        },
        FormulaBreakdown {
            name: "Safety stock".to_string(),
            formula: "z(service_level) * sigma_lead_time".to_string(),
            parameters: vec![
                ("z".to_string(), record.z_score),
                ("sigma_lead_time".to_string(), record.demand_std_dev_lead_time),
            ],
            result: record.safety_stock,
        },
        FormulaBreakdown {
            name: "Reorder point".to_string(),
            formula: "mean_lead_time_demand + safety_stock".to_string(),
            parameters: vec![
                ("mean_lead_time_demand".to_string(), record.demand_mean_lead_time),
                ("safety_stock".to_string(), record.safety_stock),
            ],
            result: record.reorder_point,
        },
    ]
}

fn constraint_impacts(record: &DecisionRecord) -> Vec<ConstraintImpact> {
    record
        .adjustments
        .iter()
        .map(|a| ConstraintImpact {
            kind: a.kind,
            description: a.note.clone(),
            quantity_delta: a.quantity_after - a.quantity_before,
            cost_impact: a.cost_impact,
            severity: severity_for_cost(a.cost_impact),
        })
        .collect()
}

fn risk_factors(record: &DecisionRecord) -> Vec<RiskFactor> {
    let mut factors: Vec<RiskFactor> = record
        .risk_flags
        .iter()
        .map(|flag| match flag {
            RiskFlag::HighVolatility => RiskFactor {
                name: "high_volatility".to_string(),
                description: "Historic demand varies strongly around its mean; safety stock may be understated.".to_string(),
                severity: Severity::Medium,
            },
            RiskFlag::IntermittentDemand => RiskFactor {
                name: "intermittent_demand".to_string(),
                description: "Many zero-demand periods; normal-distribution assumptions are weak here.".to_string(),
                severity: Severity::Medium,
            },
            RiskFlag::TrendingUp => RiskFactor {
                name: "trending_up".to_string(),
                description: "Recent demand runs well above baseline; the forecast may lag the trend.".to_string(),
                severity: Severity::Medium,
            },
            RiskFlag::TrendingDown => RiskFactor {
                name: "trending_down".to_string(),
                description: "Recent demand runs well below baseline; overstock risk on this order.".to_string(),
                severity: Severity::Low,
            },
            RiskFlag::HighStockoutRisk => RiskFactor {
                name: "high_stockout_risk".to_string(),
                description: "Residual stockout risk remains above tolerance at the chosen reorder point.".to_string(),
                severity: Severity::High,
            },
            RiskFlag::LongLeadTime => RiskFactor {
                name: "long_lead_time".to_string(),
                description: "Lead time exceeds six weeks; forecast error compounds before stock arrives.".to_string(),
                severity: Severity::Medium,
            },
        })
        .collect();

    if record.stockout_risk > 0.10 && !record.risk_flags.contains(&RiskFlag::HighStockoutRisk) {
        factors.push(RiskFactor {
            name: "elevated_stockout_risk".to_string(),
            description: format!(
                "Stockout risk of {:.1}% is above the usual tolerance band.",
                record.stockout_risk * 100.0
            ),
            severity: Severity::Medium,
        });
    }

    factors
}

/// Adjacent supported service levels for the up/down what-ifs.
fn adjacent_service_levels(level: f64) -> (Option<f64>, Option<f64>) {
    const TIERS: [f64; 4] = [0.90, 0.95, 0.98, 0.99];
    let idx = TIERS.iter().position(|t| (t - level).abs() < 1e-9);
    match idx {
        Some(i) => (
            i.checked_sub(1).map(|j| TIERS[j]),
            TIERS.get(i + 1).copied(),
        ),
        None => (Some(0.90), Some(0.98)),
    }
}

fn what_if(record: &DecisionRecord) -> Vec<WhatIfScenario> {
    let p = &record.profile;
    let mut scenarios = Vec::new();

    let (down, up) = adjacent_service_levels(record.service_level);
    for (label, level) in [("service level down", down), ("service level up", up)] {
        let Some(level) = level else { continue };
        let Ok(alt) = plan_sku(p, level) else { continue };

        // Service level changes safety stock, not the order quantity itself.
        let holding_delta = alt.annual_holding_cost - record.annual_holding_cost;
        scenarios.push(WhatIfScenario {
            label: format!("{label} ({level:.2})"),
            quantity: record.recommended_quantity,
            quantity_delta: alt.safety_stock - record.safety_stock,
            cost_delta: holding_delta,
        });
    }

    if let Some(lot) = p.lot_size.filter(|l| *l > 0.0) {
        let doubled = apply_order_constraints(record.eoq, p.moq, Some(lot * 2.0), p.unit_cost);
        let qty_delta = doubled.quantity - record.recommended_quantity;
        scenarios.push(WhatIfScenario {
            label: format!("doubled lot size ({})", lot * 2.0),
            quantity: doubled.quantity,
            quantity_delta: qty_delta,
            cost_delta: qty_delta * p.unit_cost,
        });
    }

    scenarios
}

fn sensitivity(record: &DecisionRecord) -> SensitivityTable {
    let p = &record.profile;
    let mut entries = Vec::new();

    for pct in [-0.20, -0.10, 0.10, 0.20] {
        let mut alt = p.clone();
        alt.annual_demand = p.annual_demand * (1.0 + pct);
        alt.daily_demand_mean = p.daily_demand_mean * (1.0 + pct);
        alt.daily_demand_std_dev = p.daily_demand_std_dev * (1.0 + pct);
        if let Ok(plan) = plan_sku(&alt, record.service_level) {
            entries.push(SensitivityEntry {
                input: SensitivityInput::Demand,
                change: format!("{:+.0}%", pct * 100.0),
                reorder_point: plan.reorder_point,
                reorder_point_delta: plan.reorder_point - record.reorder_point,
            });
        }
    }

    for days in [-3.0, -1.0, 1.0, 3.0] {
        let mut alt = p.clone();
        alt.lead_time_days = (p.lead_time_days + days).max(0.0);
        if let Ok(plan) = plan_sku(&alt, record.service_level) {
            entries.push(SensitivityEntry {
                input: SensitivityInput::LeadTime,
                change: format!("{days:+.0} days"),
                reorder_point: plan.reorder_point,
                reorder_point_delta: plan.reorder_point - record.reorder_point,
            });
        }
    }

    let worst = |input: SensitivityInput| {
        entries
            .iter()
            .filter(|e| e.input == input)
            .map(|e| e.reorder_point_delta.abs())
            .fold(0.0, f64::max)
    };
    let most_sensitive = if worst(SensitivityInput::Demand) >= worst(SensitivityInput::LeadTime) {
        SensitivityInput::Demand
    } else {
        SensitivityInput::LeadTime
    };

    SensitivityTable {
        entries,
        most_sensitive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use replan_core::{AbcClass, ChannelType, ConstraintAdjustment, SkuId, SkuProfile};
    use replan_model::plan_sku;

    fn record() -> DecisionRecord {
        let profile = SkuProfile {
            id: SkuId::new("SKU-D"),
            annual_demand: 3650.0,
            daily_demand_mean: 10.0,
            daily_demand_std_dev: 2.0,
            lead_time_days: 14.0,
            lead_time_std_dev: 0.0,
            unit_cost: 10.0,
            unit_price: 25.0,
            holding_cost_rate: 0.25,
            ordering_cost: 50.0,
            moq: Some(500.0),
            lot_size: Some(50.0),
            current_inventory: 200.0,
            channel: ChannelType::Ecommerce,
            category: "general".to_string(),
        };
        let plan = plan_sku(&profile, 0.95).unwrap();

        DecisionRecord {
            service_level: plan.service_level,
            service_level_fallback: false,
            abc_class: Some(AbcClass::B),
            eoq: plan.eoq,
            demand_mean_lead_time: plan.lead_time_demand.mean,
            demand_std_dev_lead_time: plan.lead_time_demand.std_dev,
            z_score: plan.z_score,
            safety_stock: plan.safety_stock,
            reorder_point: plan.reorder_point,
            recommended_quantity: 500.0,
            recommended_order_date: "2025-06-01".parse().unwrap(),
            stockout_risk: plan.stockout_risk,
            annual_holding_cost: plan.annual_holding_cost,
            investment: 5_000.0,
            adjustments: vec![ConstraintAdjustment {
                kind: AdjustmentKind::MoqConstraint,
                quantity_before: plan.eoq,
                quantity_after: 500.0,
                cost_impact: (500.0 - plan.eoq) * 10.0,
                note: "raised to supplier minimum order quantity 500".to_string(),
            }],
            risk_flags: vec![RiskFlag::HighVolatility],
            created_at: Utc::now(),
            profile,
        }
    }

    #[test]
    fn explanation_covers_every_section() {
        let record = record();
        let explanation = explain(&record);

        assert!(explanation.summary.contains("SKU-D"));
        assert_eq!(explanation.breakdowns.len(), 3);
        assert_eq!(explanation.constraint_impacts.len(), 1);
        assert!(!explanation.risk_factors.is_empty());
        assert!(!explanation.what_if.is_empty());
        assert!(!explanation.sensitivity.entries.is_empty());
    }

    #[test]
    fn explain_does_not_mutate_the_record() {
        let record = record();
        let before = record.clone();
        let _ = explain(&record);
        assert_eq!(record, before);
    }

    #[test]
    fn severity_tiers_threshold_on_cost_impact() {
        assert_eq!(severity_for_cost(100.0), Severity::Low);
        assert_eq!(severity_for_cost(1_500.0), Severity::Medium);
        assert_eq!(severity_for_cost(7_500.0), Severity::High);
    }

    #[test]
    fn approval_tiers_follow_investment_size() {
        assert_eq!(approval_tier(5_000.0), ApprovalTier::Automatic);
        assert_eq!(approval_tier(25_000.0), ApprovalTier::Manager);
        assert_eq!(approval_tier(100_000.0), ApprovalTier::Director);
        assert_eq!(approval_tier(500_000.0), ApprovalTier::Board);
    }

    #[test]
    fn sensitivity_grid_has_both_axes_and_a_winner() {
        let record = record();
        let table = sensitivity(&record);

        let demand_rows = table
            .entries
            .iter()
            .filter(|e| e.input == SensitivityInput::Demand)
            .count();
        let lead_rows = table
            .entries
            .iter()
            .filter(|e| e.input == SensitivityInput::LeadTime)
            .count();
        assert_eq!(demand_rows, 4);
        assert_eq!(lead_rows, 4);
        // ±20% on a 140-unit lead-time mean beats ±3 days at 10/day.
        assert_eq!(table.most_sensitive, SensitivityInput::Demand);
    }

    #[test]
    fn what_if_includes_adjacent_service_levels() {
        let record = record();
        let scenarios = what_if(&record);

        assert!(scenarios.iter().any(|s| s.label.contains("0.90")));
        assert!(scenarios.iter().any(|s| s.label.contains("0.98")));
        assert!(scenarios.iter().any(|s| s.label.contains("doubled lot")));
    }

    #[test]
    fn higher_service_level_costs_more_holding() {
        let record = record();
        let scenarios = what_if(&record);
        let up = scenarios
            .iter()
            .find(|s| s.label.contains("service level up"))
            .unwrap();
        assert!(up.cost_delta > 0.0);
        assert!(up.quantity_delta > 0.0);
    }
}
