//! Warehouse network reference data: warehouses, trade routes, duty and
//! shipping tables.
//!
//! Assembled from out-of-scope configuration sources; the arbitrator treats it
//! as read-only.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use replan_core::{ChannelType, RegionId, WarehouseId};

use crate::fx::{Currency, FxTable};

/// A source warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub region: RegionId,
    /// Currency its unit costs are quoted in.
    pub currency: Currency,
    /// Days from order to dispatch when sourcing from this warehouse.
    pub base_lead_time_days: f64,
}

/// Per-SKU availability and cost at one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPosition {
    pub warehouse_id: WarehouseId,
    /// Units this warehouse can commit to the destination.
    pub available_capacity: f64,
    /// Unit cost in the warehouse's own currency.
    pub unit_cost: f64,
}

/// Trade-lane data for one (source warehouse, destination region) pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TradeRoute {
    /// Import duty rate by product category; categories not listed pay none.
    pub duty_rates: HashMap<String, f64>,
    pub shipping_cost_per_unit: f64,
    /// Extra transit days for crossing the border on this lane.
    pub cross_border_days: f64,
}

impl TradeRoute {
    pub fn duty_rate(&self, category: &str) -> f64 {
        self.duty_rates.get(category).copied().unwrap_or(0.0)
    }
}

/// Inter-warehouse transfer lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRoute {
    pub from: WarehouseId,
    pub to: WarehouseId,
    /// Cost per unit moved.
    pub base_rate: f64,
    /// Added per unit when the lane crosses regions.
    pub cross_region_surcharge: f64,
    /// Shipments below this many units are not worth consolidating.
    pub min_shipment_units: f64,
}

/// Base stockout penalty per unit of unmet demand, by sales channel.
///
/// Marketplace stockouts cost ranking and buy-box share on top of the lost
/// sale, so they carry the highest base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPenalties {
    pub marketplace: f64,
    pub ecommerce: f64,
    pub retail: f64,
    pub wholesale: f64,
}

impl Default for ChannelPenalties {
    fn default() -> Self {
        Self {
            marketplace: 1_000.0,
            ecommerce: 750.0,
            retail: 500.0,
            wholesale: 250.0,
        }
    }
}

impl ChannelPenalties {
    pub fn base_penalty(&self, channel: ChannelType) -> f64 {
        match channel {
            ChannelType::Marketplace => self.marketplace,
            ChannelType::Ecommerce => self.ecommerce,
            ChannelType::Retail => self.retail,
            ChannelType::Wholesale => self.wholesale,
        }
    }
}

/// The full sourcing network the arbitrator evaluates against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcingNetwork {
    pub warehouses: Vec<Warehouse>,
    /// Trade lanes keyed by (source warehouse, destination region).
    pub routes: HashMap<(WarehouseId, RegionId), TradeRoute>,
    pub transfer_routes: Vec<TransferRoute>,
    pub fx: FxTable,
    pub penalties: ChannelPenalties,
}

impl SourcingNetwork {
    pub fn warehouse(&self, id: &WarehouseId) -> Option<&Warehouse> {
        self.warehouses.iter().find(|w| &w.id == id)
    }

    /// Trade lane for a (source, destination) pair, if configured.
    pub fn route(&self, source: &WarehouseId, dest: &RegionId) -> Option<&TradeRoute> {
        self.routes.get(&(source.clone(), dest.clone()))
    }

    pub fn transfer_route(&self, from: &WarehouseId, to: &WarehouseId) -> Option<&TransferRoute> {
        self.transfer_routes
            .iter()
            .find(|r| &r.from == from && &r.to == to)
    }
}
