//! `replan-model`: the statistical inventory model and ABC classifier.
//!
//! Pure functions over `SkuProfile` snapshots: EOQ, lead-time demand
//! aggregation, safety stock, reorder point, stockout risk, revenue-tiered
//! classification and risk-flag derivation.

pub mod abc;
pub mod history;
pub mod statistics;

pub use abc::{AbcAssignment, AbcClassification, ClassSummary, classify};
pub use history::derive_risk_flags;
pub use statistics::{
    InventoryPlan, LeadTimeDemand, eoq, lead_time_demand, normal_cdf, plan_sku, safety_stock,
    stockout_risk, z_score,
};
