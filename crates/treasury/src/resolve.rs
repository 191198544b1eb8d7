//! Facility-violation resolution.
//!
//! When a projected timeline breaches the facility limit, the lowest-priority
//! orders are pushed forward by a fixed grace period until the projection fits
//! (or nothing is left to defer). Priorities use the same value-density
//! formula as budget admission, so the two passes defer the same SKUs.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use replan_core::SkuId;

use crate::timeline::{
    CashFlowTimeline, FacilityConfig, PaymentTerms, PlannedOrder, project_timeline,
};

/// One applied deferral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDeferral {
    pub sku_id: SkuId,
    pub original_order_date: NaiveDate,
    pub deferred_order_date: NaiveDate,
}

/// Outcome of the resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    /// The plan after deferrals, in the original order.
    pub orders: Vec<PlannedOrder>,
    pub deferrals: Vec<OrderDeferral>,
    /// Final projection for the adjusted plan.
    pub timeline: CashFlowTimeline,
    /// False when the limit still cannot be met after exhausting deferrals.
    pub resolved: bool,
}

/// Upper bound on deferral rounds; each round shifts one order by the grace
/// period, so this caps how far any plan can be pushed out.
const MAX_ROUNDS_PER_ORDER: usize = 8;

/// Defer lowest-priority orders until the projected requirement fits the
/// facility limit.
pub fn resolve_violations(
    mut orders: Vec<PlannedOrder>,
    terms: &PaymentTerms,
    facility: &FacilityConfig,
    grace_period_days: u64,
) -> ResolutionOutcome {
    let mut deferrals = Vec::new();
    let mut timeline = project_timeline(&orders, terms, facility);

    if !timeline.has_violation() {
        return ResolutionOutcome {
            orders,
            deferrals,
            timeline,
            resolved: true,
        };
    }

    let max_rounds = orders.len() * MAX_ROUNDS_PER_ORDER;
    let mut rounds = 0;

    while timeline.has_violation() && rounds < max_rounds {
        // Re-rank each round: a deferred order keeps its priority but may be
        // deferred again if it still contributes to the breach.
        let Some(idx) = lowest_priority_index(&orders) else {
            break;
        };

        let original = orders[idx].order_date;
        orders[idx].order_date = original + Days::new(grace_period_days);
        orders[idx].delivery_date = orders[idx].delivery_date + Days::new(grace_period_days);

        debug!(
            sku = %orders[idx].sku_id,
            from = %original,
            to = %orders[idx].order_date,
            "deferring order to relieve facility"
        );
        deferrals.push(OrderDeferral {
            sku_id: orders[idx].sku_id.clone(),
            original_order_date: original,
            deferred_order_date: orders[idx].order_date,
        });

        timeline = project_timeline(&orders, terms, facility);
        rounds += 1;
    }

    let resolved = !timeline.has_violation();
    if !resolved {
        warn!(
            rounds,
            "facility violation not resolvable by deferral alone"
        );
    }

    ResolutionOutcome {
        orders,
        deferrals,
        timeline,
        resolved,
    }
}

/// Index of the lowest-priority order with a positive investment.
fn lowest_priority_index(orders: &[PlannedOrder]) -> Option<usize> {
    orders
        .iter()
        .enumerate()
        .filter(|(_, o)| o.investment() > 0.0)
        .min_by(|(_, a), (_, b)| {
            a.priority()
                .partial_cmp(&b.priority())
                .unwrap_or(core::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn order(id: &str, investment: f64, benefit: f64, order_date: &str) -> PlannedOrder {
        PlannedOrder {
            sku_id: SkuId::new(id),
            quantity: investment / 10.0,
            unit_cost: 10.0,
            order_date: date(order_date),
            delivery_date: date(order_date) + Days::new(14),
            holding_cost_saved: 0.0,
            stockout_cost_avoided: benefit,
        }
    }

    #[test]
    fn clean_plan_needs_no_deferrals() {
        let orders = vec![order("SKU-1", 500.0, 1_000.0, "2025-01-01")];
        let outcome = resolve_violations(
            orders,
            &PaymentTerms::default(),
            &FacilityConfig::new(10_000.0),
            7,
        );
        assert!(outcome.resolved);
        assert!(outcome.deferrals.is_empty());
    }

    #[test]
    fn lowest_priority_order_is_deferred_first() {
        // Both payments land on the same date; together they breach the limit.
        let orders = vec![
            order("SKU-HIGH", 600.0, 1_800.0, "2025-01-01"), // priority 3.0
            order("SKU-LOW", 600.0, 600.0, "2025-01-01"),    // priority 1.0
        ];
        let outcome = resolve_violations(
            orders,
            &PaymentTerms::default(),
            &FacilityConfig::new(900.0),
            7,
        );

        assert!(outcome.resolved);
        assert!(!outcome.deferrals.is_empty());
        assert_eq!(outcome.deferrals[0].sku_id, SkuId::new("SKU-LOW"));
        // The high-priority order keeps its date.
        assert_eq!(outcome.orders[0].order_date, date("2025-01-01"));
    }

    #[test]
    fn deferral_shifts_by_the_grace_period() {
        let orders = vec![
            order("SKU-1", 600.0, 1_800.0, "2025-01-01"),
            order("SKU-2", 600.0, 600.0, "2025-01-01"),
        ];
        let outcome = resolve_violations(
            orders,
            &PaymentTerms::default(),
            &FacilityConfig::new(900.0),
            10,
        );
        let deferral = &outcome.deferrals[0];
        assert_eq!(
            deferral.deferred_order_date,
            deferral.original_order_date + Days::new(10)
        );
    }

    #[test]
    fn unresolvable_plan_reports_not_resolved() {
        // A single order larger than the facility can never fit.
        let orders = vec![order("SKU-1", 5_000.0, 5_000.0, "2025-01-01")];
        let outcome = resolve_violations(
            orders,
            &PaymentTerms::default(),
            &FacilityConfig::new(900.0),
            7,
        );
        assert!(!outcome.resolved);
        assert!(outcome.timeline.has_violation());
    }
}
