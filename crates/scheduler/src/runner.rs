//! Dispatch from job payloads into the planning pipeline.
//!
//! The match over [`JobPayload`] is exhaustive: a new job kind does not
//! compile until it is handled here. Cancellation is cooperative: the flag
//! is observed between stages, never mid-computation. The task yields at
//! stage boundaries so long pipelines cannot monopolize the worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::task::yield_now;

use replan_diagnostics::explain;
use replan_engine::{
    ProgressSink, WorkingCapitalRequest, analyze_working_capital, cfo_report, optimize_batch,
    optimize_sku, orders_from_records, plan_multi_warehouse,
};

use crate::error::JobError;
use crate::types::{JobOutput, JobPayload};

/// Service level applied when a single-SKU job does not name one.
const DEFAULT_SERVICE_LEVEL: f64 = 0.95;

/// Per-attempt execution context handed to the runner.
#[derive(Clone)]
pub struct JobContext {
    cancelled: Arc<AtomicBool>,
    progress: Arc<dyn ProgressSink>,
}

impl JobContext {
    pub fn new(cancelled: Arc<AtomicBool>, progress: Arc<dyn ProgressSink>) -> Self {
        Self {
            cancelled,
            progress,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    fn checkpoint(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

/// Executes one job attempt.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn execute(&self, payload: JobPayload, ctx: JobContext) -> Result<JobOutput, JobError>;
}

/// The production runner: routes every payload into the planning crates.
#[derive(Debug, Default)]
pub struct PipelineRunner;

#[async_trait]
impl JobRunner for PipelineRunner {
    async fn execute(&self, payload: JobPayload, ctx: JobContext) -> Result<JobOutput, JobError> {
        ctx.checkpoint()?;

        match payload {
            JobPayload::SkuOptimization {
                profile,
                history,
                service_level,
                today,
            } => {
                let level = service_level.unwrap_or(DEFAULT_SERVICE_LEVEL);
                let record = optimize_sku(&profile, history.as_ref(), level, today)?;
                ctx.progress().report("optimize", 100, "sku optimized");
                Ok(JobOutput::SkuOptimization(record))
            }

            JobPayload::BatchOptimization {
                profiles,
                histories,
                config,
                today,
            } => {
                let outcome = optimize_batch(&profiles, &histories, config, today, ctx.progress());
                yield_now().await;
                ctx.checkpoint()?;
                Ok(JobOutput::BatchOptimization(outcome))
            }

            JobPayload::MultiWarehouseOptimization { network, demands } => {
                let plan = plan_multi_warehouse(&network, &demands, ctx.progress());
                yield_now().await;
                ctx.checkpoint()?;
                Ok(JobOutput::MultiWarehouseOptimization(plan))
            }

            JobPayload::WorkingCapitalAnalysis { request } => {
                let analysis = analyze_working_capital(request, ctx.progress());
                yield_now().await;
                ctx.checkpoint()?;
                Ok(JobOutput::WorkingCapitalAnalysis(analysis))
            }

            JobPayload::CfoReportGeneration {
                profiles,
                histories,
                config,
                today,
                facility,
            } => {
                let batch_progress = ScaledProgress::new(ctx.progress(), 0, 60);
                let batch = optimize_batch(&profiles, &histories, config, today, &batch_progress);
                yield_now().await;
                ctx.checkpoint()?;

                let analysis = match facility {
                    Some(facility) => {
                        let wc_progress = ScaledProgress::new(ctx.progress(), 60, 90);
                        let orders = orders_from_records(&batch.records);
                        let request = WorkingCapitalRequest::new(orders, facility);
                        let analysis = analyze_working_capital(request, &wc_progress);
                        yield_now().await;
                        ctx.checkpoint()?;
                        Some(analysis)
                    }
                    None => None,
                };

                let report = cfo_report(&batch, analysis.as_ref());
                ctx.progress().report("report", 95, "cfo report assembled");
                Ok(JobOutput::CfoReportGeneration(report))
            }

            JobPayload::DiagnosticsAnalysis { record } => {
                let explanation = explain(&record);
                ctx.progress().report("explain", 100, "decision explained");
                Ok(JobOutput::DiagnosticsAnalysis(explanation))
            }
        }
    }
}

/// Maps an inner 0..=100 progress range onto a slice of the outer one, so
/// chained pipeline stages report monotone percentages end to end.
struct ScaledProgress<'a> {
    inner: &'a dyn ProgressSink,
    lo: u8,
    hi: u8,
}

impl<'a> ScaledProgress<'a> {
    fn new(inner: &'a dyn ProgressSink, lo: u8, hi: u8) -> Self {
        Self { inner, lo, hi }
    }
}

impl ProgressSink for ScaledProgress<'_> {
    fn report(&self, stage: &str, percent: u8, message: &str) {
        let span = (self.hi - self.lo) as u32;
        let mapped = self.lo + (percent.min(100) as u32 * span / 100) as u8;
        self.inner.report(stage, mapped, message);
    }
}
