//! Inter-warehouse transfer scoring.
//!
//! A transfer is recommended only when the stockout cost it avoids beats its
//! freight cost *and* the lane's minimum-shipment threshold is met. Everything
//! else is still returned, scored, so planners can see near-misses.

use serde::{Deserialize, Serialize};

use replan_core::{SkuId, WarehouseId};

use crate::network::TransferRoute;

/// Scored transfer proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEvaluation {
    pub sku_id: SkuId,
    pub from: WarehouseId,
    pub to: WarehouseId,
    pub quantity: f64,
    /// (base rate + cross-region surcharge) × quantity.
    pub transfer_cost: f64,
    pub stockout_cost_avoided: f64,
    /// stockout cost avoided − transfer cost.
    pub net_benefit: f64,
    pub meets_minimum_shipment: bool,
    pub recommended: bool,
}

/// Score one proposed transfer over a configured lane.
pub fn score_transfer(
    route: &TransferRoute,
    sku_id: SkuId,
    quantity: f64,
    stockout_cost_avoided: f64,
) -> TransferEvaluation {
    let transfer_cost = (route.base_rate + route.cross_region_surcharge) * quantity;
    let net_benefit = stockout_cost_avoided - transfer_cost;
    let meets_minimum = quantity >= route.min_shipment_units;

    TransferEvaluation {
        sku_id,
        from: route.from.clone(),
        to: route.to.clone(),
        quantity,
        transfer_cost,
        stockout_cost_avoided,
        net_benefit,
        meets_minimum_shipment: meets_minimum,
        recommended: net_benefit > 0.0 && meets_minimum,
    }
}
