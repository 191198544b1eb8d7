//! Three-tier FIFO priority queue.
//!
//! Dispatch order is strict: every queued high job goes before any normal
//! job, every normal before any low. Within a tier, insertion order holds.

use std::collections::VecDeque;

use replan_core::JobId;

use crate::types::JobPriority;

#[derive(Debug, Default)]
pub struct PriorityQueue {
    high: VecDeque<JobId>,
    normal: VecDeque<JobId>,
    low: VecDeque<JobId>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, priority: JobPriority, job_id: JobId) {
        match priority {
            JobPriority::High => self.high.push_back(job_id),
            JobPriority::Normal => self.normal.push_back(job_id),
            JobPriority::Low => self.low.push_back(job_id),
        }
    }

    pub fn pop(&mut self) -> Option<JobId> {
        self.high
            .pop_front()
            .or_else(|| self.normal.pop_front())
            .or_else(|| self.low.pop_front())
    }

    /// Remove a queued job (used by cancellation). Returns whether the job
    /// was present.
    pub fn remove(&mut self, job_id: &JobId) -> bool {
        for tier in [&mut self.high, &mut self.normal, &mut self.low] {
            if let Some(pos) = tier.iter().position(|id| id == job_id) {
                tier.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.normal.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
