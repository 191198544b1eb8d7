//! `replan-treasury`: working-capital cash-flow simulation.
//!
//! Projects an order plan into a dated timeline against a facility limit and,
//! when the plan breaches it, defers low-priority orders until it fits.

pub mod resolve;
pub mod timeline;

pub use resolve::{OrderDeferral, ResolutionOutcome, resolve_violations};
pub use timeline::{
    CashFlowEntry, CashFlowKind, CashFlowTimeline, DatedBalance, FacilityConfig, PaymentTerms,
    PlannedOrder, WorkingCapitalKpis, kpis, project_timeline,
};
