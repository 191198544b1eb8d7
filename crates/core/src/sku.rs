//! SKU master data as consumed by the planning pipeline.
//!
//! Profiles arrive from out-of-scope integration layers; the core treats them
//! as immutable snapshots for the duration of one call.

use serde::{Deserialize, Serialize};

use crate::id::SkuId;

/// Sales channel a SKU is primarily sold through.
///
/// Drives the stockout-penalty base used by sourcing arbitration: a marketplace
/// stockout costs ranking and buy-box share, which outweighs a wholesale
/// backorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    Ecommerce,
    Marketplace,
    Wholesale,
    Retail,
}

/// Immutable per-call snapshot of one SKU's planning inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuProfile {
    pub id: SkuId,
    /// Forecast annual demand in units.
    pub annual_demand: f64,
    /// Mean daily demand in units.
    pub daily_demand_mean: f64,
    /// Standard deviation of daily demand.
    pub daily_demand_std_dev: f64,
    /// Supplier lead time in days.
    pub lead_time_days: f64,
    /// Standard deviation of lead time in days (0 = fixed lead time).
    pub lead_time_std_dev: f64,
    /// Purchase cost per unit.
    pub unit_cost: f64,
    /// Selling price per unit (used for revenue ranking).
    pub unit_price: f64,
    /// Annual holding cost as a fraction of unit cost (e.g. 0.25).
    pub holding_cost_rate: f64,
    /// Fixed cost of placing one order.
    pub ordering_cost: f64,
    /// Supplier minimum order quantity, if any.
    pub moq: Option<f64>,
    /// Supplier lot/carton size, if any. Orders must be a multiple of this.
    pub lot_size: Option<f64>,
    /// Units currently on hand.
    pub current_inventory: f64,
    pub channel: ChannelType,
    /// Free-form product category (drives duty-rate lookup).
    pub category: String,
}

impl SkuProfile {
    /// Annual revenue at forecast demand, the ABC ranking key.
    pub fn annual_revenue(&self) -> f64 {
        self.annual_demand * self.unit_price
    }
}

/// Ordered per-period demand observations for one SKU.
///
/// Read-only: the pipeline only derives risk flags from it, it never feeds the
/// statistical formulas directly (the forecast is an input, not produced here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandHistory {
    pub sku_id: SkuId,
    /// Demand per period, oldest first.
    pub observations: Vec<f64>,
}

impl DemandHistory {
    pub fn new(sku_id: SkuId, observations: Vec<f64>) -> Self {
        Self {
            sku_id,
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
