//! Bounded history of terminal jobs and the stats derived from it.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use replan_core::JobId;

use crate::types::{JobStatus, JobType};

/// One finished job, as remembered by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub job_id: JobId,
    pub job_type: JobType,
    /// Terminal status only.
    pub status: JobStatus,
    pub retry_count: u32,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

/// Retain-by-count ring of terminal jobs. Oldest entries fall off once the
/// capacity is reached; the ring is the retention policy for terminal jobs,
/// so evictions are handed back for the caller to release the rest of the
/// job's state.
#[derive(Debug)]
pub struct JobHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl JobHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Record a terminal job, returning the entry that aged out (if any).
    pub fn record(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        debug_assert!(entry.status.is_terminal());
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn stats(&self) -> SchedulerStats {
        let mut stats = SchedulerStats::default();
        let mut total_duration_ms = 0u64;

        for entry in &self.entries {
            match entry.status {
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Failed { .. } => stats.failed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
                _ => {}
            }
            total_duration_ms += entry.duration_ms;
        }

        let total = self.entries.len() as u64;
        if total > 0 {
            let decided = stats.completed + stats.failed;
            stats.success_rate = if decided > 0 {
                stats.completed as f64 / decided as f64
            } else {
                0.0
            };
            stats.average_duration_ms = total_duration_ms as f64 / total as f64;
        }
        stats
    }
}

/// Throughput view over the retained history window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    /// Completed over (completed + failed); cancellations excluded.
    pub success_rate: f64,
    pub average_duration_ms: f64,
}
