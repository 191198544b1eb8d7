//! Risk-flag derivation from demand history and statistical outputs.
//!
//! History is read-only here: flags annotate the decision record, they never
//! change the recommended quantity.

use replan_core::{DemandHistory, RiskFlag, SkuProfile};

use crate::statistics::InventoryPlan;

/// Coefficient of variation above which demand counts as highly volatile.
const VOLATILITY_CV: f64 = 0.5;
/// Share of zero-demand periods above which demand counts as intermittent.
const INTERMITTENT_ZERO_SHARE: f64 = 0.3;
/// Recent-vs-baseline mean ratio bounds for trend flags.
const TREND_UP_RATIO: f64 = 1.3;
const TREND_DOWN_RATIO: f64 = 0.7;
/// Residual stockout risk above this is worth surfacing.
const STOCKOUT_RISK_THRESHOLD: f64 = 0.05;
/// Lead times beyond six weeks compound forecast error.
const LONG_LEAD_TIME_DAYS: f64 = 42.0;

/// Derive risk flags for one SKU.
///
/// Trend flags compare the most recent quarter of observations against the
/// mean of the rest; both need at least four observations to fire.
pub fn derive_risk_flags(
    profile: &SkuProfile,
    history: Option<&DemandHistory>,
    plan: &InventoryPlan,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();

    if let Some(history) = history {
        let obs = &history.observations;
        if obs.len() >= 4 {
            let n = obs.len() as f64;
            let mean = obs.iter().sum::<f64>() / n;
            let variance = obs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();

            if mean > 0.0 && std_dev / mean > VOLATILITY_CV {
                flags.push(RiskFlag::HighVolatility);
            }

            let zeros = obs.iter().filter(|x| **x == 0.0).count() as f64;
            if zeros / n > INTERMITTENT_ZERO_SHARE {
                flags.push(RiskFlag::IntermittentDemand);
            }

            let recent_len = (obs.len() / 4).max(1);
            let (baseline, recent) = obs.split_at(obs.len() - recent_len);
            let baseline_mean = baseline.iter().sum::<f64>() / baseline.len() as f64;
            let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
            if baseline_mean > 0.0 {
                let ratio = recent_mean / baseline_mean;
                if ratio > TREND_UP_RATIO {
                    flags.push(RiskFlag::TrendingUp);
                } else if ratio < TREND_DOWN_RATIO {
                    flags.push(RiskFlag::TrendingDown);
                }
            }
        }
    }

    if plan.stockout_risk > STOCKOUT_RISK_THRESHOLD {
        flags.push(RiskFlag::HighStockoutRisk);
    }
    if profile.lead_time_days > LONG_LEAD_TIME_DAYS {
        flags.push(RiskFlag::LongLeadTime);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use replan_core::{ChannelType, SkuId};

    use crate::statistics::plan_sku;

    fn profile() -> SkuProfile {
        SkuProfile {
            id: SkuId::new("SKU-H"),
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

    fn history(obs: Vec<f64>) -> DemandHistory {
        DemandHistory::new(SkuId::new("SKU-H"), obs)
    }

    #[test]
    fn volatile_history_is_flagged() {
        let p = profile();
        let plan = plan_sku(&p, 0.99).unwrap();
        let h = history(vec![1.0, 50.0, 2.0, 80.0, 1.0, 60.0, 3.0, 90.0]);

        let flags = derive_risk_flags(&p, Some(&h), &plan);
        assert!(flags.contains(&RiskFlag::HighVolatility));
    }

    #[test]
    fn intermittent_history_is_flagged() {
        let p = profile();
        let plan = plan_sku(&p, 0.99).unwrap();
        let h = history(vec![0.0, 0.0, 5.0, 0.0, 6.0, 0.0, 5.0, 0.0]);

        let flags = derive_risk_flags(&p, Some(&h), &plan);
        assert!(flags.contains(&RiskFlag::IntermittentDemand));
    }

    #[test]
    fn rising_recent_demand_trends_up() {
        let p = profile();
        let plan = plan_sku(&p, 0.99).unwrap();
        let h = history(vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0, 22.0]);

        let flags = derive_risk_flags(&p, Some(&h), &plan);
        assert!(flags.contains(&RiskFlag::TrendingUp));
        assert!(!flags.contains(&RiskFlag::TrendingDown));
    }

    #[test]
    fn long_lead_time_is_flagged_without_history() {
        let mut p = profile();
        p.lead_time_days = 60.0;
        let plan = plan_sku(&p, 0.99).unwrap();

        let flags = derive_risk_flags(&p, None, &plan);
        assert!(flags.contains(&RiskFlag::LongLeadTime));
    }

    #[test]
    fn short_history_produces_no_demand_flags() {
        let p = profile();
        let plan = plan_sku(&p, 0.99).unwrap();
        let h = history(vec![0.0, 100.0]);

        let flags = derive_risk_flags(&p, Some(&h), &plan);
        assert!(!flags.contains(&RiskFlag::HighVolatility));
        assert!(!flags.contains(&RiskFlag::IntermittentDemand));
    }
}
