//! `replan-scheduler`: async job scheduling for the planning pipeline.
//!
//! Jobs are typed payloads dispatched from a three-tier priority queue by a
//! tick loop, with bounded concurrency, per-attempt timeouts, exponential
//! retry backoff and cooperative cancellation. Every lifecycle transition is
//! published as a [`replan_events::JobEvent`].

pub mod error;
pub mod history;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod types;

pub use error::JobError;
pub use history::{HistoryEntry, JobHistory, SchedulerStats};
pub use queue::PriorityQueue;
pub use runner::{JobContext, JobRunner, PipelineRunner};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use types::{
    JobOptions, JobOutput, JobPayload, JobPriority, JobSnapshot, JobStatus, JobTicket, JobType,
    ProgressReport,
};
