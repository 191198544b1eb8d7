//! Multi-warehouse planning: per-SKU/region sourcing arbitration plus a
//! transfer scan for demands nothing can serve directly.

use serde::{Deserialize, Serialize};
use tracing::info;

use replan_sourcing::{
    SourcingDecision, SourcingNetwork, SourcingQuery, StockPosition, TransferEvaluation,
    arbitrate, score_transfer,
};

use crate::progress::ProgressSink;

/// One demand line to be sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcingDemand {
    pub query: SourcingQuery,
    /// Candidate stock positions for this SKU across the network.
    pub positions: Vec<StockPosition>,
}

/// Arbitration result for one demand line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcingAssignment {
    pub query: SourcingQuery,
    pub decision: SourcingDecision,
}

/// The full multi-warehouse plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiWarehousePlan {
    pub assignments: Vec<SourcingAssignment>,
    /// Transfer proposals scored for demands with no feasible direct source.
    pub transfers: Vec<TransferEvaluation>,
    pub infeasible_demands: usize,
}

/// Arbitrate every demand line, then scan transfer lanes for the ones left
/// without a feasible source.
pub fn plan_multi_warehouse(
    network: &SourcingNetwork,
    demands: &[SourcingDemand],
    progress: &dyn ProgressSink,
) -> MultiWarehousePlan {
    let mut assignments = Vec::with_capacity(demands.len());
    let total = demands.len().max(1);

    for (i, demand) in demands.iter().enumerate() {
        let decision = arbitrate(network, &demand.query, &demand.positions);
        assignments.push(SourcingAssignment {
            query: demand.query.clone(),
            decision,
        });
        // Arbitration spans 5..=70.
        let percent = 5 + ((i + 1) * 65 / total) as u8;
        progress.report(
            "arbitrate",
            percent,
            &format!("arbitrated {}/{} demand lines", i + 1, demands.len()),
        );
    }

    progress.report("transfers", 80, "scoring transfers for unserved demand");
    let mut transfers = Vec::new();
    let mut infeasible = 0;

    for assignment in &assignments {
        let SourcingDecision::NoFeasibleSource { .. } = assignment.decision else {
            continue;
        };
        infeasible += 1;

        let query = &assignment.query;
        // Try topping up each destination-region warehouse over its inbound
        // transfer lanes.
        for route in &network.transfer_routes {
            let Some(dest_wh) = network.warehouse(&route.to) else {
                continue;
            };
            if dest_wh.region != query.dest_region {
                continue;
            }
            let avoided = network.penalties.base_penalty(query.channel)
                * (1.0 - query.service_level)
                * query.demand_forecast;
            transfers.push(score_transfer(
                route,
                query.sku_id.clone(),
                query.demand_forecast,
                avoided,
            ));
        }
    }

    info!(
        demands = demands.len(),
        infeasible,
        transfers = transfers.len(),
        "multi-warehouse plan built"
    );

    MultiWarehousePlan {
        assignments,
        transfers,
        infeasible_demands: infeasible,
    }
}
