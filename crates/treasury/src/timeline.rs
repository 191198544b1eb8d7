//! Cash-flow timeline projection for an order plan.
//!
//! Each planned order produces one supplier payment (outflow) and one customer
//! receipt (inflow, margin-scaled); entries aggregate per date and cumulate in
//! date order. The facility limit is an enterprise-wide cash ceiling; the
//! projection reports how hard the plan leans on it.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use replan_core::SkuId;

/// Payment terms applied when projecting an order plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerms {
    /// Days after order placement until the supplier is paid.
    pub supplier_days: u64,
    /// Days after delivery until customers pay for the sold-through stock.
    pub customer_days: u64,
    /// Receipt scaling: revenue recovered per unit of inventory cost.
    pub margin_multiplier: f64,
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self {
            supplier_days: 30,
            customer_days: 45,
            margin_multiplier: 1.4,
        }
    }
}

/// One order in the plan being projected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedOrder {
    pub sku_id: SkuId,
    pub quantity: f64,
    pub unit_cost: f64,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    /// Benefit figures feed the deferral ranking during resolution.
    pub holding_cost_saved: f64,
    pub stockout_cost_avoided: f64,
}

impl PlannedOrder {
    pub fn investment(&self) -> f64 {
        self.quantity * self.unit_cost
    }

    /// Same value-density ranking the admission pass uses.
    pub fn priority(&self) -> f64 {
        let investment = self.investment();
        if investment > 0.0 {
            (self.holding_cost_saved + self.stockout_cost_avoided) / investment
        } else {
            0.0
        }
    }
}

/// Direction of a dated cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowKind {
    /// Supplier payment (negative amount).
    Payment,
    /// Customer receipt (positive amount).
    Receipt,
}

/// One dated cash movement. Negative = payment, positive = receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowEntry {
    pub date: NaiveDate,
    pub amount: f64,
    pub kind: CashFlowKind,
    pub sku_id: SkuId,
}

/// Facility configuration for one region/entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Hard limit of the working-capital facility.
    pub limit: f64,
    /// Fraction of the limit treasury wants to stay under, (0, 1].
    pub utilization_target: f64,
    /// Headroom reserved for unplanned draws; reported, not enforced.
    pub reserve: f64,
}

impl FacilityConfig {
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            utilization_target: 0.8,
            reserve: 0.0,
        }
    }
}

/// Cumulative position on one date with entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedBalance {
    pub date: NaiveDate,
    /// Net movement on this date.
    pub net_flow: f64,
    /// Running balance: cumulative[t] = cumulative[t-1] + net_flow[t].
    pub cumulative_balance: f64,
    /// Cash drawn from the facility: max(0, -cumulative_balance).
    pub facility_requirement: f64,
    /// facility_requirement / facility limit.
    pub utilization: f64,
    /// Requirement above the utilization target but still inside the limit.
    pub exceeds_target: bool,
    /// Requirement above the hard limit.
    pub violation: bool,
}

/// The projected timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowTimeline {
    /// All entries, date ascending.
    pub entries: Vec<CashFlowEntry>,
    /// Per-date cumulative positions, date ascending.
    pub balances: Vec<DatedBalance>,
}

impl CashFlowTimeline {
    pub fn violations(&self) -> impl Iterator<Item = &DatedBalance> {
        self.balances.iter().filter(|b| b.violation)
    }

    pub fn has_violation(&self) -> bool {
        self.balances.iter().any(|b| b.violation)
    }

    pub fn peak_requirement(&self) -> Option<&DatedBalance> {
        self.balances.iter().max_by(|a, b| {
            a.facility_requirement
                .partial_cmp(&b.facility_requirement)
                .unwrap_or(core::cmp::Ordering::Equal)
        })
    }
}

/// Headline figures for treasury reporting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkingCapitalKpis {
    pub peak_requirement: f64,
    pub peak_date: Option<NaiveDate>,
    pub average_utilization: f64,
    pub violation_days: usize,
    pub target_breach_days: usize,
}

/// Project an order plan into a dated cash-flow timeline.
pub fn project_timeline(
    orders: &[PlannedOrder],
    terms: &PaymentTerms,
    facility: &FacilityConfig,
) -> CashFlowTimeline {
    let mut entries = Vec::with_capacity(orders.len() * 2);

    for order in orders {
        let investment = order.investment();
        if investment == 0.0 {
            continue;
        }
        entries.push(CashFlowEntry {
            date: order.order_date + Days::new(terms.supplier_days),
            amount: -investment,
            kind: CashFlowKind::Payment,
            sku_id: order.sku_id.clone(),
        });
        entries.push(CashFlowEntry {
            date: order.delivery_date + Days::new(terms.customer_days),
            amount: investment * terms.margin_multiplier,
            kind: CashFlowKind::Receipt,
            sku_id: order.sku_id.clone(),
        });
    }

    entries.sort_by_key(|e| e.date);

    let mut balances: Vec<DatedBalance> = Vec::new();
    let mut cumulative = 0.0;
    let target = facility.limit * facility.utilization_target;

    let mut i = 0;
    while i < entries.len() {
        let date = entries[i].date;
        let mut net = 0.0;
        while i < entries.len() && entries[i].date == date {
            net += entries[i].amount;
            i += 1;
        }
        cumulative += net;

        let requirement = (-cumulative).max(0.0);
        let utilization = if facility.limit > 0.0 {
            requirement / facility.limit
        } else {
            0.0
        };
        balances.push(DatedBalance {
            date,
            net_flow: net,
            cumulative_balance: cumulative,
            facility_requirement: requirement,
            utilization,
            exceeds_target: requirement > target && requirement <= facility.limit,
            violation: requirement > facility.limit,
        });
    }

    CashFlowTimeline { entries, balances }
}

/// Roll a timeline up into KPIs.
pub fn kpis(timeline: &CashFlowTimeline) -> WorkingCapitalKpis {
    let peak = timeline.peak_requirement();
    let n = timeline.balances.len();
    WorkingCapitalKpis {
        peak_requirement: peak.map(|b| b.facility_requirement).unwrap_or(0.0),
        peak_date: peak.map(|b| b.date),
        average_utilization: if n > 0 {
            timeline.balances.iter().map(|b| b.utilization).sum::<f64>() / n as f64
        } else {
            0.0
        },
        violation_days: timeline.balances.iter().filter(|b| b.violation).count(),
        target_breach_days: timeline
            .balances
            .iter()
            .filter(|b| b.exceeds_target)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn order(id: &str, qty: f64, cost: f64, order_date: &str, delivery: &str) -> PlannedOrder {
        PlannedOrder {
            sku_id: SkuId::new(id),
            quantity: qty,
            unit_cost: cost,
            order_date: date(order_date),
            delivery_date: date(delivery),
            holding_cost_saved: 100.0,
            stockout_cost_avoided: 100.0,
        }
    }

    #[test]
    fn payment_and_receipt_land_on_term_shifted_dates() {
        let orders = vec![order("SKU-1", 100.0, 10.0, "2025-01-01", "2025-01-15")];
        let terms = PaymentTerms {
            supplier_days: 30,
            customer_days: 45,
            margin_multiplier: 1.5,
        };
        let timeline = project_timeline(&orders, &terms, &FacilityConfig::new(10_000.0));

        assert_eq!(timeline.entries.len(), 2);
        assert_eq!(timeline.entries[0].date, date("2025-01-31"));
        assert_eq!(timeline.entries[0].amount, -1_000.0);
        assert_eq!(timeline.entries[1].date, date("2025-03-01"));
        assert_eq!(timeline.entries[1].amount, 1_500.0);
    }

    #[test]
    fn same_date_entries_aggregate() {
        let orders = vec![
            order("SKU-1", 100.0, 10.0, "2025-01-01", "2025-02-01"),
            order("SKU-2", 50.0, 10.0, "2025-01-01", "2025-02-01"),
        ];
        let timeline = project_timeline(
            &orders,
            &PaymentTerms::default(),
            &FacilityConfig::new(10_000.0),
        );

        // One payment date, one receipt date.
        assert_eq!(timeline.balances.len(), 2);
        assert_eq!(timeline.balances[0].net_flow, -1_500.0);
    }

    #[test]
    fn violation_only_above_limit_target_breach_flagged_separately() {
        let orders = vec![order("SKU-1", 100.0, 10.0, "2025-01-01", "2025-02-01")];
        // Requirement peaks at 1000; limit 1100, target 0.8 => 880.
        let facility = FacilityConfig {
            limit: 1_100.0,
            utilization_target: 0.8,
            reserve: 0.0,
        };
        let timeline = project_timeline(&orders, &PaymentTerms::default(), &facility);

        let peak = timeline.peak_requirement().unwrap();
        assert_eq!(peak.facility_requirement, 1_000.0);
        assert!(peak.exceeds_target);
        assert!(!peak.violation);
        assert!(!timeline.has_violation());
    }

    #[test]
    fn limit_breach_is_a_violation() {
        let orders = vec![order("SKU-1", 100.0, 10.0, "2025-01-01", "2025-02-01")];
        let facility = FacilityConfig::new(900.0);
        let timeline = project_timeline(&orders, &PaymentTerms::default(), &facility);

        assert!(timeline.has_violation());
        let k = kpis(&timeline);
        assert_eq!(k.peak_requirement, 1_000.0);
        assert_eq!(k.violation_days, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// cumulative[t] = cumulative[t-1] + net_flow[t] for every t.
        #[test]
        fn cumulative_balance_invariant(
            quantities in prop::collection::vec(1.0f64..500.0, 1..12),
            offsets in prop::collection::vec(0u64..90, 1..12),
        ) {
            let base = date("2025-01-01");
            let orders: Vec<PlannedOrder> = quantities
                .iter()
                .zip(offsets.iter())
                .enumerate()
                .map(|(i, (q, off))| PlannedOrder {
                    sku_id: SkuId::new(format!("SKU-{i}")),
                    quantity: *q,
                    unit_cost: 10.0,
                    order_date: base + Days::new(*off),
                    delivery_date: base + Days::new(off + 14),
                    holding_cost_saved: 0.0,
                    stockout_cost_avoided: 0.0,
                })
                .collect();

            let timeline = project_timeline(
                &orders,
                &PaymentTerms::default(),
                &FacilityConfig::new(1e9),
            );

            let mut prev = 0.0;
            for balance in &timeline.balances {
                prop_assert!((balance.cumulative_balance - (prev + balance.net_flow)).abs() < 1e-6);
                prev = balance.cumulative_balance;
            }
        }
    }
}
