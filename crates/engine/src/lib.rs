//! `replan-engine`: the replenishment optimization pipeline.
//!
//! Composes the statistical model, ABC classifier, constraint applier,
//! sourcing arbitrator and working-capital simulator into the operations the
//! job scheduler dispatches.

pub mod multi_warehouse;
pub mod optimizer;
pub mod progress;
pub mod report;
pub mod working_capital;

pub use multi_warehouse::{
    MultiWarehousePlan, SourcingAssignment, SourcingDemand, plan_multi_warehouse,
};
pub use optimizer::{
    BatchOutcome, OptimizationConfig, OptimizationSummary, SkuFailure, optimize_batch,
    optimize_sku,
};
pub use progress::{NullProgress, ProgressSink};
pub use report::{CfoReport, cfo_report};
pub use working_capital::{
    WorkingCapitalAnalysis, WorkingCapitalRequest, analyze_working_capital, orders_from_records,
};
