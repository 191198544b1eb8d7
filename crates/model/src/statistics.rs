//! Statistical inventory model: EOQ, safety stock, reorder point, stockout
//! risk.
//!
//! Stateless given a `SkuProfile`. All functions validate their numeric
//! inputs and return `DomainError` for degenerate values; "the answer is
//! uncomfortable" (high risk, huge order) is never an error.

use serde::{Deserialize, Serialize};

use replan_core::{DomainError, DomainResult, SkuProfile};

/// Service levels with pre-computed one-sided normal quantiles.
///
/// Anything else falls back to the 0.95 quantile, flagged on the result.
const Z_TABLE: &[(f64, f64)] = &[
    (0.90, 1.2816),
    (0.95, 1.6449),
    (0.98, 2.0537),
    (0.99, 2.3263),
];

const FALLBACK_SERVICE_LEVEL: f64 = 0.95;
const FALLBACK_Z: f64 = 1.6449;

/// Resolve the z-score for a service level.
///
/// Returns `(z, fallback)` where `fallback` is true when the level was not one
/// of the supported tiers and the 0.95 quantile was substituted.
pub fn z_score(service_level: f64) -> (f64, bool) {
    for (level, z) in Z_TABLE {
        if (service_level - level).abs() < 1e-9 {
            return (*z, false);
        }
    }
    (FALLBACK_Z, true)
}

/// Demand aggregated over the (possibly variable) lead time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeDemand {
    /// Mean demand over lead time.
    pub mean: f64,
    /// Standard deviation of demand over lead time.
    pub std_dev: f64,
}

/// Full statistical output for one SKU at one service level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryPlan {
    pub eoq: f64,
    pub lead_time_demand: LeadTimeDemand,
    pub service_level: f64,
    pub service_level_fallback: bool,
    pub z_score: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub stockout_risk: f64,
    /// Annual cost of carrying cycle stock (EOQ/2) plus safety stock.
    pub annual_holding_cost: f64,
}

/// Economic order quantity: √(2·D·S / (h·c)).
///
/// Errors when the holding-cost denominator is not strictly positive or any
/// input is non-finite.
pub fn eoq(profile: &SkuProfile) -> DomainResult<f64> {
    let d = profile.annual_demand;
    let s = profile.ordering_cost;
    let rate = profile.holding_cost_rate;
    let cost = profile.unit_cost;

    if !(d.is_finite() && s.is_finite() && rate.is_finite() && cost.is_finite()) {
        return Err(DomainError::validation("non-finite EOQ input"));
    }
    if d < 0.0 || s < 0.0 {
        return Err(DomainError::validation(
            "annual demand and ordering cost must be non-negative",
        ));
    }
    // Checked per factor: a negative rate times a negative cost would pass a
    // product-level check with nonsense inputs.
    if rate <= 0.0 || cost <= 0.0 {
        return Err(DomainError::validation(
            "unit cost and holding cost rate must be positive",
        ));
    }

    Ok((2.0 * d * s / (rate * cost)).sqrt())
}

/// Aggregate daily demand over the lead time.
///
/// Fixed lead time (`lead_time_std_dev == 0`):
/// σ_LT = √L · σ_d. Variable lead time:
/// σ_LT = √(σ_d²·L + μ_d²·σ_L²). In both cases μ_LT = μ_d·L.
pub fn lead_time_demand(profile: &SkuProfile) -> DomainResult<LeadTimeDemand> {
    let mu = profile.daily_demand_mean;
    let sigma = profile.daily_demand_std_dev;
    let lt = profile.lead_time_days;
    let lt_sigma = profile.lead_time_std_dev;

    if !(mu.is_finite() && sigma.is_finite() && lt.is_finite() && lt_sigma.is_finite()) {
        return Err(DomainError::validation("non-finite lead-time demand input"));
    }
    if mu < 0.0 || sigma < 0.0 || lt < 0.0 || lt_sigma < 0.0 {
        return Err(DomainError::validation(
            "demand and lead-time parameters must be non-negative",
        ));
    }

    let std_dev = if lt_sigma > 0.0 {
        (sigma * sigma * lt + mu * mu * lt_sigma * lt_sigma).sqrt()
    } else {
        lt.sqrt() * sigma
    };

    Ok(LeadTimeDemand {
        mean: mu * lt,
        std_dev,
    })
}

/// Safety stock = z(serviceLevel) · σ_LT. Returns `(stock, fallback)`.
pub fn safety_stock(lead_time_std_dev: f64, service_level: f64) -> (f64, bool) {
    let (z, fallback) = z_score(service_level);
    (z * lead_time_std_dev, fallback)
}

/// Standard normal CDF, Abramowitz & Stegun 26.2.17.
///
/// Absolute error below 7.5e-8, comfortably inside the 1e-6 tolerance needed
/// for |z| < 6.
pub fn normal_cdf(z: f64) -> f64 {
    if z < -8.0 {
        return 0.0;
    }
    if z > 8.0 {
        return 1.0;
    }

    let x = z.abs();
    let t = 1.0 / (1.0 + 0.2316419 * x);
    let poly = t
        * (0.319381530
            + t * (-0.356563782 + t * (1.781477937 + t * (-1.821255978 + t * 1.330274429))));
    let pdf = (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let tail = pdf * poly;

    if z >= 0.0 { 1.0 - tail } else { tail }
}

/// Probability of stocking out during lead time given a reorder point.
///
/// 1 − Φ((ROP − μ_LT) / σ_LT), clamped to [0, 1]. Defined as 0 when σ_LT = 0
/// (deterministic demand never outruns its own mean).
pub fn stockout_risk(reorder_point: f64, lead_time: LeadTimeDemand) -> f64 {
    if lead_time.std_dev == 0.0 {
        return 0.0;
    }
    let z = (reorder_point - lead_time.mean) / lead_time.std_dev;
    (1.0 - normal_cdf(z)).clamp(0.0, 1.0)
}

/// Compute the full statistical plan for one SKU.
pub fn plan_sku(profile: &SkuProfile, service_level: f64) -> DomainResult<InventoryPlan> {
    let eoq = eoq(profile)?;
    let ltd = lead_time_demand(profile)?;
    let (ss, fallback) = safety_stock(ltd.std_dev, service_level);
    let rop = ltd.mean + ss;
    let (z, _) = z_score(service_level);

    let effective_level = if fallback {
        FALLBACK_SERVICE_LEVEL
    } else {
        service_level
    };

    Ok(InventoryPlan {
        eoq,
        lead_time_demand: ltd,
        service_level: effective_level,
        service_level_fallback: fallback,
        z_score: z,
        safety_stock: ss,
        reorder_point: rop,
        stockout_risk: stockout_risk(rop, ltd),
        annual_holding_cost: (eoq / 2.0 + ss) * profile.holding_cost_rate * profile.unit_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use replan_core::{ChannelType, SkuId};

    fn profile() -> SkuProfile {
        SkuProfile {
            id: SkuId::new("SKU-A"),
            annual_demand: 3650.0,
            daily_demand_mean: 10.0,
            daily_demand_std_dev: 2.0,
            lead_time_days: 14.0,
            lead_time_std_dev: 0.0,
            unit_cost: 10.0,
            unit_price: 25.0,
            holding_cost_rate: 0.25,
            ordering_cost: 50.0,
            moq: None,
            lot_size: None,
            current_inventory: 200.0,
            channel: ChannelType::Ecommerce,
            category: "general".to_string(),
        }
    }

    #[test]
    fn scenario_a_matches_reference_numbers() {
        let plan = plan_sku(&profile(), 0.95).unwrap();

        // EOQ = sqrt(2 * 3650 * 50 / 2.5) = sqrt(146000) ≈ 382.1
        assert!((plan.eoq - 382.1).abs() < 0.1, "eoq = {}", plan.eoq);
        // safety stock = 1.6449 * sqrt(14) * 2 ≈ 12.31
        assert!((plan.safety_stock - 12.31).abs() < 0.05);
        // ROP = 140 + safety stock ≈ 152.3
        assert!((plan.reorder_point - 152.3).abs() < 0.1);
        assert!(!plan.service_level_fallback);
    }

    #[test]
    fn eoq_rejects_zero_holding_cost() {
        let mut p = profile();
        p.holding_cost_rate = 0.0;
        assert!(matches!(eoq(&p), Err(DomainError::Validation(_))));
    }

    #[test]
    fn eoq_rejects_negative_cost_pairs() {
        // Both factors negative: the product is positive but the inputs are
        // nonsense and must not produce a plan.
        let mut p = profile();
        p.unit_cost = -10.0;
        p.holding_cost_rate = -0.25;
        assert!(matches!(eoq(&p), Err(DomainError::Validation(_))));
        assert!(matches!(plan_sku(&p, 0.95), Err(DomainError::Validation(_))));
    }

    #[test]
    fn unknown_service_level_falls_back_and_is_flagged() {
        let plan = plan_sku(&profile(), 0.93).unwrap();
        assert!(plan.service_level_fallback);
        assert!((plan.service_level - 0.95).abs() < 1e-9);
        assert!((plan.z_score - 1.6449).abs() < 1e-9);
    }

    #[test]
    fn variable_lead_time_widens_sigma() {
        let fixed = lead_time_demand(&profile()).unwrap();

        let mut p = profile();
        p.lead_time_std_dev = 3.0;
        let variable = lead_time_demand(&p).unwrap();

        assert_eq!(fixed.mean, variable.mean);
        assert!(variable.std_dev > fixed.std_dev);
        // sqrt(4 * 14 + 100 * 9) = sqrt(956)
        assert!((variable.std_dev - 956.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn risk_at_mean_is_one_half() {
        let ltd = LeadTimeDemand {
            mean: 140.0,
            std_dev: 7.48,
        };
        let risk = stockout_risk(140.0, ltd);
        assert!((risk - 0.5).abs() < 1e-6);
    }

    #[test]
    fn risk_is_zero_for_deterministic_demand() {
        let ltd = LeadTimeDemand {
            mean: 140.0,
            std_dev: 0.0,
        };
        assert_eq!(stockout_risk(100.0, ltd), 0.0);
    }

    #[test]
    fn normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.6449) - 0.95).abs() < 1e-4);
        assert!((normal_cdf(-1.6449) - 0.05).abs() < 1e-4);
        assert!((normal_cdf(2.3263) - 0.99).abs() < 1e-4);
    }

    #[test]
    fn safety_stock_increases_across_service_tiers() {
        let sigma = 7.5;
        let tiers = [0.90, 0.95, 0.98, 0.99];
        let stocks: Vec<f64> = tiers.iter().map(|t| safety_stock(sigma, *t).0).collect();
        for w in stocks.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// EOQ is increasing in demand and ordering cost, decreasing in
        /// holding cost and unit cost.
        #[test]
        fn eoq_monotonicity(
            demand in 1.0f64..1e6,
            ordering in 1.0f64..1e4,
            rate in 0.01f64..1.0,
            cost in 0.1f64..1e4,
        ) {
            let mut p = profile();
            p.annual_demand = demand;
            p.ordering_cost = ordering;
            p.holding_cost_rate = rate;
            p.unit_cost = cost;

            let base = eoq(&p).unwrap();

            let mut up = p.clone();
            up.annual_demand = demand * 2.0;
            prop_assert!(eoq(&up).unwrap() > base);

            let mut costly = p.clone();
            costly.unit_cost = cost * 2.0;
            prop_assert!(eoq(&costly).unwrap() < base);
        }

        /// Stockout risk stays inside [0, 1] for arbitrary finite inputs.
        #[test]
        fn stockout_risk_is_a_probability(
            rop in -1e6f64..1e6,
            mean in -1e6f64..1e6,
            sigma in 0.0f64..1e5,
        ) {
            let risk = stockout_risk(rop, LeadTimeDemand { mean, std_dev: sigma });
            prop_assert!((0.0..=1.0).contains(&risk));
        }

        /// Safety stock grows with demand variability.
        #[test]
        fn safety_stock_monotone_in_sigma(sigma in 0.0f64..1e4) {
            let (lo, _) = safety_stock(sigma, 0.95);
            let (hi, _) = safety_stock(sigma + 1.0, 0.95);
            prop_assert!(hi > lo);
        }
    }
}
