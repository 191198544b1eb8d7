//! Job types, options and status snapshots.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use replan_core::{DecisionRecord, DemandHistory, JobId, SkuId, SkuProfile};
use replan_diagnostics::DecisionExplanation;
use replan_engine::{
    BatchOutcome, CfoReport, MultiWarehousePlan, OptimizationConfig, SourcingDemand,
    WorkingCapitalAnalysis, WorkingCapitalRequest,
};
use replan_sourcing::SourcingNetwork;
use replan_treasury::FacilityConfig;

/// Dispatch priority. Affects dequeue order only, never preemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    High,
    Normal,
    Low,
}

impl Default for JobPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl JobPriority {
    pub fn label(&self) -> &'static str {
        match self {
            JobPriority::High => "high",
            JobPriority::Normal => "normal",
            JobPriority::Low => "low",
        }
    }
}

/// The closed set of job kinds the scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    SkuOptimization,
    BatchOptimization,
    MultiWarehouseOptimization,
    WorkingCapitalAnalysis,
    CfoReportGeneration,
    DiagnosticsAnalysis,
}

impl JobType {
    /// Stable wire name, carried on lifecycle events.
    pub fn wire_name(&self) -> &'static str {
        match self {
            JobType::SkuOptimization => "sku_optimization",
            JobType::BatchOptimization => "batch_optimization",
            JobType::MultiWarehouseOptimization => "multi_warehouse_optimization",
            JobType::WorkingCapitalAnalysis => "working_capital_analysis",
            JobType::CfoReportGeneration => "cfo_report_generation",
            JobType::DiagnosticsAnalysis => "diagnostics_analysis",
        }
    }

    /// Rough wall-clock estimate surfaced on the ticket at creation time.
    pub fn estimated_duration(&self) -> Duration {
        match self {
            JobType::SkuOptimization => Duration::from_secs(2),
            JobType::BatchOptimization => Duration::from_secs(60),
            JobType::MultiWarehouseOptimization => Duration::from_secs(30),
            JobType::WorkingCapitalAnalysis => Duration::from_secs(15),
            JobType::CfoReportGeneration => Duration::from_secs(90),
            JobType::DiagnosticsAnalysis => Duration::from_secs(5),
        }
    }
}

/// Typed job input. One variant per [`JobType`]; the runner matches this
/// exhaustively, so adding a kind is a compile error until it is handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobPayload {
    SkuOptimization {
        profile: SkuProfile,
        history: Option<DemandHistory>,
        /// Explicit service level; defaults to 0.95 when absent.
        service_level: Option<f64>,
        today: NaiveDate,
    },
    BatchOptimization {
        profiles: Vec<SkuProfile>,
        histories: BTreeMap<SkuId, DemandHistory>,
        config: OptimizationConfig,
        today: NaiveDate,
    },
    MultiWarehouseOptimization {
        network: SourcingNetwork,
        demands: Vec<SourcingDemand>,
    },
    WorkingCapitalAnalysis {
        request: WorkingCapitalRequest,
    },
    CfoReportGeneration {
        profiles: Vec<SkuProfile>,
        histories: BTreeMap<SkuId, DemandHistory>,
        config: OptimizationConfig,
        today: NaiveDate,
        /// When set, a working-capital pass over the admitted plan is folded
        /// into the report.
        facility: Option<FacilityConfig>,
    },
    DiagnosticsAnalysis {
        record: DecisionRecord,
    },
}

impl JobPayload {
    pub fn job_type(&self) -> JobType {
        match self {
            JobPayload::SkuOptimization { .. } => JobType::SkuOptimization,
            JobPayload::BatchOptimization { .. } => JobType::BatchOptimization,
            JobPayload::MultiWarehouseOptimization { .. } => JobType::MultiWarehouseOptimization,
            JobPayload::WorkingCapitalAnalysis { .. } => JobType::WorkingCapitalAnalysis,
            JobPayload::CfoReportGeneration { .. } => JobType::CfoReportGeneration,
            JobPayload::DiagnosticsAnalysis { .. } => JobType::DiagnosticsAnalysis,
        }
    }
}

/// Typed job result, one variant per [`JobType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum JobOutput {
    SkuOptimization(DecisionRecord),
    BatchOptimization(BatchOutcome),
    MultiWarehouseOptimization(MultiWarehousePlan),
    WorkingCapitalAnalysis(WorkingCapitalAnalysis),
    CfoReportGeneration(CfoReport),
    DiagnosticsAnalysis(DecisionExplanation),
}

/// Per-job knobs supplied at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOptions {
    pub priority: JobPriority,
    /// Retries after the first attempt. 0 means fail terminally on the first
    /// error.
    pub max_retries: u32,
    /// Per-attempt wall-clock budget.
    pub timeout: Duration,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            priority: JobPriority::Normal,
            max_retries: 3,
            timeout: Duration::from_secs(300),
        }
    }
}

impl JobOptions {
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Job lifecycle state.
///
/// Queued → Running → Completed | Failed | Cancelled, with Running → Retrying
/// → Queued while retries remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    /// Waiting out the backoff delay before re-entering the queue.
    Retrying,
    Completed,
    Failed { error: String },
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

/// Returned by `create_job`: enough to poll for status later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTicket {
    pub job_id: JobId,
    pub status: JobStatus,
    pub estimated_duration: Duration,
}

/// Latest progress report for a running attempt. Percent is monotone within
/// an attempt and resets on retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub stage: String,
    pub percent: u8,
    pub message: String,
    pub reported_at: DateTime<Utc>,
}

/// Point-in-time view of a job, returned by `job_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub job_type: JobType,
    pub priority: JobPriority,
    pub status: JobStatus,
    pub retry_count: u32,
    pub progress: Option<ProgressReport>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Present only once the job completed.
    pub output: Option<JobOutput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = JobOptions::default();
        assert_eq!(options.priority, JobPriority::Normal);
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.timeout, Duration::from_secs(300));
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(
            JobStatus::Failed {
                error: "boom".into()
            }
            .is_terminal()
        );
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Retrying.is_terminal());
    }

    #[test]
    fn wire_names_are_stable() {
        assert_eq!(JobType::BatchOptimization.wire_name(), "batch_optimization");
        assert_eq!(
            JobType::CfoReportGeneration.wire_name(),
            "cfo_report_generation"
        );
    }
}
