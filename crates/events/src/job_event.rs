//! Job lifecycle events.
//!
//! Emitted by the scheduler on every state transition; consumed by
//! out-of-scope observability collaborators. Events are immutable facts;
//! treat them as append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use replan_core::JobId;

/// One job lifecycle transition.
///
/// `job_type` is carried as its stable wire name (e.g. `"batch_optimization"`)
/// so consumers need no dependency on the scheduler's payload types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    JobCreated {
        job_id: JobId,
        job_type: String,
        priority: String,
        occurred_at: DateTime<Utc>,
    },
    JobStarted {
        job_id: JobId,
        attempt: u32,
        occurred_at: DateTime<Utc>,
    },
    JobProgress {
        job_id: JobId,
        stage: String,
        percent: u8,
        message: String,
        occurred_at: DateTime<Utc>,
    },
    JobCompleted {
        job_id: JobId,
        duration_ms: u64,
        occurred_at: DateTime<Utc>,
    },
    JobFailed {
        job_id: JobId,
        error: String,
        occurred_at: DateTime<Utc>,
    },
    JobRetrying {
        job_id: JobId,
        retry_count: u32,
        delay_ms: u64,
        occurred_at: DateTime<Utc>,
    },
    JobCancelled {
        job_id: JobId,
        occurred_at: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Stable event name identifier.
    pub fn event_type(&self) -> &'static str {
        match self {
            JobEvent::JobCreated { .. } => "job.created",
            JobEvent::JobStarted { .. } => "job.started",
            JobEvent::JobProgress { .. } => "job.progress",
            JobEvent::JobCompleted { .. } => "job.completed",
            JobEvent::JobFailed { .. } => "job.failed",
            JobEvent::JobRetrying { .. } => "job.retrying",
            JobEvent::JobCancelled { .. } => "job.cancelled",
        }
    }

    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::JobCreated { job_id, .. }
            | JobEvent::JobStarted { job_id, .. }
            | JobEvent::JobProgress { job_id, .. }
            | JobEvent::JobCompleted { job_id, .. }
            | JobEvent::JobFailed { job_id, .. }
            | JobEvent::JobRetrying { job_id, .. }
            | JobEvent::JobCancelled { job_id, .. } => *job_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            JobEvent::JobCreated { occurred_at, .. }
            | JobEvent::JobStarted { occurred_at, .. }
            | JobEvent::JobProgress { occurred_at, .. }
            | JobEvent::JobCompleted { occurred_at, .. }
            | JobEvent::JobFailed { occurred_at, .. }
            | JobEvent::JobRetrying { occurred_at, .. }
            | JobEvent::JobCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}
