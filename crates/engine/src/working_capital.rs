//! Working-capital analysis over an order plan: projection, KPIs and the
//! deferral pass when the facility is breached.

use chrono::Days;
use serde::{Deserialize, Serialize};

use replan_core::DecisionRecord;
use replan_treasury::{
    CashFlowTimeline, FacilityConfig, PaymentTerms, PlannedOrder, ResolutionOutcome,
    WorkingCapitalKpis, kpis, project_timeline, resolve_violations,
};

use crate::progress::ProgressSink;

/// Days an order is pushed out per deferral round during resolution.
const DEFAULT_GRACE_PERIOD_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalRequest {
    pub orders: Vec<PlannedOrder>,
    pub terms: PaymentTerms,
    pub facility: FacilityConfig,
    pub grace_period_days: u64,
}

impl WorkingCapitalRequest {
    pub fn new(orders: Vec<PlannedOrder>, facility: FacilityConfig) -> Self {
        Self {
            orders,
            terms: PaymentTerms::default(),
            facility,
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }
}

/// Full analysis output: the as-planned projection, its KPIs and (only when
/// the facility was breached) the deferral-pass outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCapitalAnalysis {
    pub timeline: CashFlowTimeline,
    pub kpis: WorkingCapitalKpis,
    pub resolution: Option<ResolutionOutcome>,
}

impl WorkingCapitalAnalysis {
    /// KPIs of the plan that would actually be executed (post-resolution when
    /// one ran).
    pub fn effective_kpis(&self) -> WorkingCapitalKpis {
        match &self.resolution {
            Some(resolution) => kpis(&resolution.timeline),
            None => self.kpis.clone(),
        }
    }
}

/// Project the plan and, if it breaches the facility, run the deferral pass.
pub fn analyze_working_capital(
    request: WorkingCapitalRequest,
    progress: &dyn ProgressSink,
) -> WorkingCapitalAnalysis {
    progress.report("project", 20, "projecting cash-flow timeline");
    let timeline = project_timeline(&request.orders, &request.terms, &request.facility);

    progress.report("kpis", 50, "computing working-capital KPIs");
    let timeline_kpis = kpis(&timeline);

    let resolution = if timeline.has_violation() {
        progress.report("resolve", 70, "deferring orders to fit the facility");
        Some(resolve_violations(
            request.orders,
            &request.terms,
            &request.facility,
            request.grace_period_days,
        ))
    } else {
        None
    };

    WorkingCapitalAnalysis {
        timeline,
        kpis: timeline_kpis,
        resolution,
    }
}

/// Lift decision records into planned orders for the treasury projection.
///
/// Deferred/zero-quantity records are skipped; delivery is assumed one lead
/// time after order placement.
pub fn orders_from_records(records: &[DecisionRecord]) -> Vec<PlannedOrder> {
    records
        .iter()
        .filter(|r| r.recommended_quantity > 0.0)
        .map(|r| PlannedOrder {
            sku_id: r.profile.id.clone(),
            quantity: r.recommended_quantity,
            unit_cost: r.profile.unit_cost,
            order_date: r.recommended_order_date,
            delivery_date: r.recommended_order_date
                + Days::new(r.profile.lead_time_days.ceil().max(0.0) as u64),
            holding_cost_saved: 0.0,
            stockout_cost_avoided: (0.5 - r.stockout_risk).max(0.0)
                * r.demand_mean_lead_time
                * r.profile.unit_price,
        })
        .collect()
}
