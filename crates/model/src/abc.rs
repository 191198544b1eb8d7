//! ABC classification: revenue-tiered SKU grouping driving differentiated
//! service levels.

use serde::{Deserialize, Serialize};

use replan_core::{AbcClass, SkuId, SkuProfile};

/// Cumulative revenue-share boundaries for classes A and B.
const CLASS_A_SHARE: f64 = 0.80;
const CLASS_B_SHARE: f64 = 0.95;

/// One SKU's classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcAssignment {
    pub sku_id: SkuId,
    pub class: AbcClass,
    pub annual_revenue: f64,
    /// Cumulative revenue share up to and including this SKU, in rank order.
    pub cumulative_share: f64,
}

/// Per-class rollup for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassSummary {
    pub sku_count: usize,
    pub revenue: f64,
    pub revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbcClassification {
    /// Assignments in rank order (revenue descending, SKU id ascending on ties).
    pub assignments: Vec<AbcAssignment>,
    pub class_a: ClassSummary,
    pub class_b: ClassSummary,
    pub class_c: ClassSummary,
}

impl AbcClassification {
    pub fn class_of(&self, sku_id: &SkuId) -> Option<AbcClass> {
        self.assignments
            .iter()
            .find(|a| &a.sku_id == sku_id)
            .map(|a| a.class)
    }
}

/// Rank SKUs by annual revenue and assign classes.
///
/// Deterministic: ties on revenue are broken by SKU id ascending. A portfolio
/// with zero total revenue classifies everything as C (there is nothing to
/// prioritize).
pub fn classify(profiles: &[SkuProfile]) -> AbcClassification {
    let mut ranked: Vec<(&SkuProfile, f64)> =
        profiles.iter().map(|p| (p, p.annual_revenue())).collect();
    ranked.sort_by(|(a, ra), (b, rb)| {
        rb.partial_cmp(ra)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let total: f64 = ranked.iter().map(|(_, r)| r).sum();

    let mut assignments = Vec::with_capacity(ranked.len());
    let mut cumulative = 0.0;
    let mut class_a = ClassSummary::default();
    let mut class_b = ClassSummary::default();
    let mut class_c = ClassSummary::default();

    for (profile, revenue) in ranked {
        cumulative += revenue;
        let share = if total > 0.0 { cumulative / total } else { 1.0 };

        let class = if total <= 0.0 {
            AbcClass::C
        } else if share <= CLASS_A_SHARE {
            AbcClass::A
        } else if share <= CLASS_B_SHARE {
            AbcClass::B
        } else {
            AbcClass::C
        };

        let summary = match class {
            AbcClass::A => &mut class_a,
            AbcClass::B => &mut class_b,
            AbcClass::C => &mut class_c,
        };
        summary.sku_count += 1;
        summary.revenue += revenue;

        assignments.push(AbcAssignment {
            sku_id: profile.id.clone(),
            class,
            annual_revenue: revenue,
            cumulative_share: share,
        });
    }

    for summary in [&mut class_a, &mut class_b, &mut class_c] {
        summary.revenue_share = if total > 0.0 {
            summary.revenue / total
        } else {
            0.0
        };
    }

    AbcClassification {
        assignments,
        class_a,
        class_b,
        class_c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replan_core::ChannelType;

    fn sku(id: &str, annual_demand: f64, unit_price: f64) -> SkuProfile {
        SkuProfile {
            id: SkuId::new(id),
            annual_demand,
            daily_demand_mean: annual_demand / 365.0,
            daily_demand_std_dev: 1.0,
            lead_time_days: 14.0,
            lead_time_std_dev: 0.0,
            unit_cost: unit_price / 2.0,
            unit_price,
            holding_cost_rate: 0.25,
            ordering_cost: 50.0,
            moq: None,
            lot_size: None,
            current_inventory: 0.0,
            channel: ChannelType::Ecommerce,
            category: "general".to_string(),
        }
    }

    #[test]
    fn classes_follow_cumulative_revenue_share() {
        // Revenues: 700, 150, 100, 50 => total 1000.
        let profiles = vec![
            sku("SKU-1", 700.0, 1.0),
            sku("SKU-2", 150.0, 1.0),
            sku("SKU-3", 100.0, 1.0),
            sku("SKU-4", 50.0, 1.0),
        ];
        let result = classify(&profiles);

        let classes: Vec<AbcClass> = result.assignments.iter().map(|a| a.class).collect();
        // 70% -> A, 85% -> B, 95% -> B, 100% -> C
        assert_eq!(
            classes,
            vec![AbcClass::A, AbcClass::B, AbcClass::B, AbcClass::C]
        );
        assert_eq!(result.class_a.sku_count, 1);
        assert_eq!(result.class_b.sku_count, 2);
        assert_eq!(result.class_c.sku_count, 1);
    }

    #[test]
    fn revenue_ties_break_by_sku_id() {
        let profiles = vec![
            sku("SKU-B", 100.0, 1.0),
            sku("SKU-A", 100.0, 1.0),
        ];
        let result = classify(&profiles);
        assert_eq!(result.assignments[0].sku_id, SkuId::new("SKU-A"));
        assert_eq!(result.assignments[1].sku_id, SkuId::new("SKU-B"));
    }

    #[test]
    fn class_service_levels_are_tiered() {
        assert_eq!(AbcClass::A.service_level(), 0.99);
        assert_eq!(AbcClass::B.service_level(), 0.98);
        assert_eq!(AbcClass::C.service_level(), 0.95);
    }

    #[test]
    fn zero_revenue_portfolio_is_all_class_c() {
        let profiles = vec![sku("SKU-1", 0.0, 0.0), sku("SKU-2", 0.0, 0.0)];
        let result = classify(&profiles);
        assert!(result.assignments.iter().all(|a| a.class == AbcClass::C));
    }
}
