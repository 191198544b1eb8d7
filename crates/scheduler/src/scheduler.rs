//! The job scheduler: a fixed-interval tick loop over a single-writer state.
//!
//! All mutable state (queue, job map, history) lives behind one `Mutex` and
//! the lock is never held across an await, so every transition is a small
//! critical section and there is exactly one writer at a time. Worker tasks
//! are spawned per attempt up to the concurrency limit; priority affects
//! dispatch order only, running jobs are never preempted. Cancellation and
//! timeouts are best-effort: the cancellation flag is observed by the runner
//! between stages, and a timed-out attempt is abandoned at its next await.
//! Terminal jobs are retained by count (`history_capacity`); once a job ages
//! out of that window its record, payload and output are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use replan_core::{DomainError, DomainResult, JobId};
use replan_engine::ProgressSink;
use replan_events::{EventBus, JobEvent};

use crate::error::JobError;
use crate::history::{HistoryEntry, JobHistory, SchedulerStats};
use crate::queue::PriorityQueue;
use crate::runner::{JobContext, JobRunner, PipelineRunner};
use crate::types::{
    JobOptions, JobOutput, JobPayload, JobSnapshot, JobStatus, JobTicket, JobType, ProgressReport,
};

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum concurrently running jobs.
    pub concurrency_limit: usize,
    /// Dispatch loop interval.
    pub tick_interval: Duration,
    /// First retry delay; doubles per retry.
    pub retry_base_delay: Duration,
    /// Backoff cap.
    pub retry_max_delay: Duration,
    /// Most recent terminal jobs retained; older ones drop out of both the
    /// stats window and the job map.
    pub history_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 3,
            tick_interval: Duration::from_millis(50),
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(60),
            history_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }
}

/// Everything the scheduler knows about one job.
struct JobRecord {
    payload: JobPayload,
    options: JobOptions,
    job_type: JobType,
    status: JobStatus,
    retry_count: u32,
    progress: Option<ProgressReport>,
    cancel_flag: Arc<AtomicBool>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    output: Option<JobOutput>,
}

impl JobRecord {
    fn snapshot(&self, job_id: JobId) -> JobSnapshot {
        JobSnapshot {
            job_id,
            job_type: self.job_type,
            priority: self.options.priority,
            status: self.status.clone(),
            retry_count: self.retry_count,
            progress: self.progress.clone(),
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            output: self.output.clone(),
        }
    }
}

struct SchedulerState {
    queue: PriorityQueue,
    jobs: HashMap<JobId, JobRecord>,
    history: JobHistory,
    running: usize,
}

impl SchedulerState {
    /// Record a terminal job in the history ring. The ring is the retention
    /// policy: when it evicts an entry, the full job record (payload, output)
    /// is dropped from the map too, so memory stays bounded by
    /// `history_capacity` plus the non-terminal jobs.
    fn retire(&mut self, entry: HistoryEntry) {
        if let Some(evicted) = self.history.record(entry) {
            self.jobs.remove(&evicted.job_id);
        }
    }
}

struct SchedulerInner<B> {
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
    bus: B,
    runner: Arc<dyn JobRunner>,
    shutdown: AtomicBool,
}

impl<B: EventBus<JobEvent>> SchedulerInner<B> {
    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: JobEvent) {
        if let Err(error) = self.bus.publish(event) {
            warn!(?error, "event publish failed");
        }
    }
}

/// Async job scheduler over the planning pipeline.
///
/// Cheap to clone; all clones share the same state. Call [`Scheduler::run`]
/// from a spawned task to start dispatching.
pub struct Scheduler<B> {
    inner: Arc<SchedulerInner<B>>,
}

impl<B> Clone for Scheduler<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B> Scheduler<B>
where
    B: EventBus<JobEvent> + 'static,
{
    pub fn new(config: SchedulerConfig, bus: B) -> Self {
        Self::with_runner(config, bus, Arc::new(PipelineRunner))
    }

    /// Use a custom runner (alternative pipelines, tests).
    pub fn with_runner(config: SchedulerConfig, bus: B, runner: Arc<dyn JobRunner>) -> Self {
        let state = SchedulerState {
            queue: PriorityQueue::new(),
            jobs: HashMap::new(),
            history: JobHistory::new(config.history_capacity),
            running: 0,
        };
        Self {
            inner: Arc::new(SchedulerInner {
                config,
                state: Mutex::new(state),
                bus,
                runner,
                shutdown: AtomicBool::new(false),
            }),
        }
    }

    /// Enqueue a job. It starts running on a subsequent tick, subject to the
    /// concurrency limit and queue priority.
    pub fn create_job(&self, payload: JobPayload, options: JobOptions) -> JobTicket {
        let job_id = JobId::new();
        let job_type = payload.job_type();
        let priority = options.priority;
        let now = Utc::now();

        {
            let mut state = self.inner.lock_state();
            state.jobs.insert(
                job_id,
                JobRecord {
                    payload,
                    options,
                    job_type,
                    status: JobStatus::Queued,
                    retry_count: 0,
                    progress: None,
                    cancel_flag: Arc::new(AtomicBool::new(false)),
                    created_at: now,
                    started_at: None,
                    finished_at: None,
                    output: None,
                },
            );
            state.queue.push(priority, job_id);
        }

        info!(job_id = %job_id, job_type = job_type.wire_name(), "job created");
        self.inner.publish(JobEvent::JobCreated {
            job_id,
            job_type: job_type.wire_name().to_string(),
            priority: priority.label().to_string(),
            occurred_at: now,
        });

        JobTicket {
            job_id,
            status: JobStatus::Queued,
            estimated_duration: job_type.estimated_duration(),
        }
    }

    /// Current view of a job.
    ///
    /// Terminal jobs are retained only while they sit inside the history
    /// window (`history_capacity` most recent); ids that aged out return
    /// `NotFound`.
    pub fn job_status(&self, job_id: JobId) -> DomainResult<JobSnapshot> {
        let state = self.inner.lock_state();
        state
            .jobs
            .get(&job_id)
            .map(|record| record.snapshot(job_id))
            .ok_or_else(|| DomainError::not_found(format!("job {job_id}")))
    }

    /// Cancel a job. Queued jobs are removed immediately; running or retrying
    /// jobs have their flag raised and stop at the next stage boundary.
    pub fn cancel_job(&self, job_id: JobId) -> DomainResult<()> {
        let event = {
            let mut state = self.inner.lock_state();
            let record = state
                .jobs
                .get_mut(&job_id)
                .ok_or_else(|| DomainError::not_found(format!("job {job_id}")))?;

            if record.status.is_terminal() {
                return Err(DomainError::conflict(format!(
                    "job {job_id} already {:?}",
                    record.status
                )));
            }

            record.cancel_flag.store(true, Ordering::Relaxed);
            if matches!(record.status, JobStatus::Queued) {
                record.status = JobStatus::Cancelled;
                record.finished_at = Some(Utc::now());
                let entry = terminal_entry(job_id, record, 0);
                state.queue.remove(&job_id);
                state.retire(entry);
                Some(JobEvent::JobCancelled {
                    job_id,
                    occurred_at: Utc::now(),
                })
            } else {
                None
            }
        };

        info!(job_id = %job_id, "job cancellation requested");
        if let Some(event) = event {
            self.inner.publish(event);
        }
        Ok(())
    }

    /// Stats over the retained history window.
    pub fn stats(&self) -> SchedulerStats {
        self.inner.lock_state().history.stats()
    }

    /// Stop the dispatch loop at its next tick. Running jobs finish on their
    /// own.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Relaxed);
    }

    /// The dispatch loop. Run this from a spawned task; it returns after
    /// [`Scheduler::shutdown`].
    pub async fn run(&self) {
        info!(
            concurrency_limit = self.inner.config.concurrency_limit,
            "scheduler started"
        );
        while !self.inner.shutdown.load(Ordering::Relaxed) {
            self.dispatch_ready();
            sleep(self.inner.config.tick_interval).await;
        }
        info!("scheduler stopped");
    }

    /// Fill free worker slots from the queue.
    fn dispatch_ready(&self) {
        loop {
            let dispatch = {
                let mut state = self.inner.lock_state();
                if state.running >= self.inner.config.concurrency_limit {
                    None
                } else {
                    match state.queue.pop() {
                        Some(job_id) => match state.jobs.get_mut(&job_id) {
                            Some(record) => {
                                record.status = JobStatus::Running;
                                record.started_at = Some(Utc::now());
                                record.progress = None;
                                let dispatch = (
                                    job_id,
                                    record.payload.clone(),
                                    record.options.clone(),
                                    record.cancel_flag.clone(),
                                    record.retry_count,
                                );
                                state.running += 1;
                                Some(dispatch)
                            }
                            None => continue,
                        },
                        None => None,
                    }
                }
            };

            let Some((job_id, payload, options, cancel_flag, retry_count)) = dispatch else {
                break;
            };

            debug!(job_id = %job_id, attempt = retry_count + 1, "dispatching job");
            self.inner.publish(JobEvent::JobStarted {
                job_id,
                attempt: retry_count + 1,
                occurred_at: Utc::now(),
            });

            let inner = self.inner.clone();
            tokio::spawn(async move {
                run_attempt(inner, job_id, payload, options, cancel_flag).await;
            });
        }
    }
}

/// One attempt: execute under the per-job timeout, then settle the outcome.
async fn run_attempt<B>(
    inner: Arc<SchedulerInner<B>>,
    job_id: JobId,
    payload: JobPayload,
    options: JobOptions,
    cancel_flag: Arc<AtomicBool>,
) where
    B: EventBus<JobEvent> + 'static,
{
    let started = Instant::now();
    let progress: Arc<dyn ProgressSink> = Arc::new(SchedulerProgress {
        inner: inner.clone(),
        job_id,
    });
    let ctx = JobContext::new(cancel_flag, progress);

    let result = match timeout(options.timeout, inner.runner.execute(payload, ctx)).await {
        Ok(result) => result,
        Err(_) => Err(JobError::Timeout {
            timeout: options.timeout,
        }),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    settle_attempt(&inner, job_id, result, duration_ms);
}

/// Apply the attempt outcome: complete, fail, cancel, or schedule a retry.
fn settle_attempt<B>(
    inner: &Arc<SchedulerInner<B>>,
    job_id: JobId,
    result: Result<JobOutput, JobError>,
    duration_ms: u64,
) where
    B: EventBus<JobEvent> + 'static,
{
    enum Settled {
        Terminal(JobEvent),
        Retry { retry_count: u32, delay: Duration },
    }

    let settled = {
        let mut state = inner.lock_state();
        state.running = state.running.saturating_sub(1);
        let Some(record) = state.jobs.get_mut(&job_id) else {
            return;
        };
        let now = Utc::now();
        let was_cancelled = record.cancel_flag.load(Ordering::Relaxed);

        let (settled, entry) = match result {
            Ok(output) => {
                record.status = JobStatus::Completed;
                record.finished_at = Some(now);
                record.output = Some(output);
                (
                    Settled::Terminal(JobEvent::JobCompleted {
                        job_id,
                        duration_ms,
                        occurred_at: now,
                    }),
                    Some(terminal_entry(job_id, record, duration_ms)),
                )
            }
            Err(JobError::Cancelled) => {
                record.status = JobStatus::Cancelled;
                record.finished_at = Some(now);
                (
                    Settled::Terminal(JobEvent::JobCancelled {
                        job_id,
                        occurred_at: now,
                    }),
                    Some(terminal_entry(job_id, record, duration_ms)),
                )
            }
            Err(error) if was_cancelled => {
                // Flag raised while the attempt was failing anyway.
                debug!(job_id = %job_id, %error, "cancelled attempt also failed");
                record.status = JobStatus::Cancelled;
                record.finished_at = Some(now);
                (
                    Settled::Terminal(JobEvent::JobCancelled {
                        job_id,
                        occurred_at: now,
                    }),
                    Some(terminal_entry(job_id, record, duration_ms)),
                )
            }
            Err(error)
                if error.is_retryable() && record.retry_count < record.options.max_retries =>
            {
                record.retry_count += 1;
                record.status = JobStatus::Retrying;
                let delay = backoff_delay(&inner.config, record.retry_count);
                (
                    Settled::Retry {
                        retry_count: record.retry_count,
                        delay,
                    },
                    None,
                )
            }
            Err(error) => {
                record.status = JobStatus::Failed {
                    error: error.to_string(),
                };
                record.finished_at = Some(now);
                (
                    Settled::Terminal(JobEvent::JobFailed {
                        job_id,
                        error: error.to_string(),
                        occurred_at: now,
                    }),
                    Some(terminal_entry(job_id, record, duration_ms)),
                )
            }
        };

        if let Some(entry) = entry {
            state.retire(entry);
        }
        settled
    };

    match settled {
        Settled::Terminal(event) => {
            info!(job_id = %job_id, event = event.event_type(), duration_ms, "job settled");
            inner.publish(event);
        }
        Settled::Retry { retry_count, delay } => {
            warn!(job_id = %job_id, retry_count, delay_ms = delay.as_millis() as u64, "job retrying");
            inner.publish(JobEvent::JobRetrying {
                job_id,
                retry_count,
                delay_ms: delay.as_millis() as u64,
                occurred_at: Utc::now(),
            });

            let inner = inner.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                requeue_after_backoff(&inner, job_id);
            });
        }
    }
}

/// Put a retrying job back in the queue once its backoff elapsed, unless it
/// was cancelled in the meantime.
fn requeue_after_backoff<B>(inner: &Arc<SchedulerInner<B>>, job_id: JobId)
where
    B: EventBus<JobEvent>,
{
    let event = {
        let mut state = inner.lock_state();
        let Some(record) = state.jobs.get_mut(&job_id) else {
            return;
        };
        if !matches!(record.status, JobStatus::Retrying) {
            return;
        }

        if record.cancel_flag.load(Ordering::Relaxed) {
            record.status = JobStatus::Cancelled;
            record.finished_at = Some(Utc::now());
            let entry = terminal_entry(job_id, record, 0);
            state.retire(entry);
            Some(JobEvent::JobCancelled {
                job_id,
                occurred_at: Utc::now(),
            })
        } else {
            record.status = JobStatus::Queued;
            let priority = record.options.priority;
            state.queue.push(priority, job_id);
            None
        }
    };

    if let Some(event) = event {
        inner.publish(event);
    }
}

/// Exponential backoff: base · 2^(retry − 1), capped.
fn backoff_delay(config: &SchedulerConfig, retry_count: u32) -> Duration {
    let exponent = retry_count.saturating_sub(1).min(16);
    let delay = config.retry_base_delay.saturating_mul(1 << exponent);
    delay.min(config.retry_max_delay)
}

fn terminal_entry(job_id: JobId, record: &JobRecord, duration_ms: u64) -> HistoryEntry {
    HistoryEntry {
        job_id,
        job_type: record.job_type,
        status: record.status.clone(),
        retry_count: record.retry_count,
        duration_ms,
        finished_at: record.finished_at.unwrap_or_else(Utc::now),
    }
}

/// Routes pipeline progress into the job record and onto the bus. Percent is
/// kept monotone within an attempt; stale or out-of-order reports are
/// dropped.
struct SchedulerProgress<B> {
    inner: Arc<SchedulerInner<B>>,
    job_id: JobId,
}

impl<B: EventBus<JobEvent>> ProgressSink for SchedulerProgress<B> {
    fn report(&self, stage: &str, percent: u8, message: &str) {
        let percent = percent.min(100);
        let now = Utc::now();

        {
            let mut state = self.inner.lock_state();
            let Some(record) = state.jobs.get_mut(&self.job_id) else {
                return;
            };
            if !matches!(record.status, JobStatus::Running) {
                return;
            }
            if let Some(previous) = &record.progress
                && percent < previous.percent
            {
                return;
            }
            record.progress = Some(ProgressReport {
                stage: stage.to_string(),
                percent,
                message: message.to_string(),
                reported_at: now,
            });
        }

        self.inner.publish(JobEvent::JobProgress {
            job_id: self.job_id,
            stage: stage.to_string(),
            percent,
            message: message.to_string(),
            occurred_at: now,
        });
    }
}
