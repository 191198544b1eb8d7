//! Structured logging of job lifecycle events.
//!
//! Drains a bus subscription on a dedicated thread and mirrors every event
//! into tracing, so a log pipeline sees the same transitions API consumers do.

use std::thread;

use tracing::{info, warn};

use replan_events::{JobEvent, Subscription};

/// Log every event arriving on `subscription` until all publishers are gone.
///
/// Returns the logger thread's handle; join it during shutdown if ordered
/// teardown matters, otherwise just drop it.
pub fn spawn_event_logger(subscription: Subscription<JobEvent>) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("job-event-logger".to_string())
        .spawn(move || {
            while let Ok(event) = subscription.recv() {
                log_event(&event);
            }
        })
        .expect("failed to spawn event logger thread")
}

fn log_event(event: &JobEvent) {
    let job_id = event.job_id();
    match event {
        JobEvent::JobCreated {
            job_type, priority, ..
        } => {
            info!(job_id = %job_id, %job_type, %priority, event = event.event_type(), "job event");
        }
        JobEvent::JobStarted { attempt, .. } => {
            info!(job_id = %job_id, attempt = *attempt, event = event.event_type(), "job event");
        }
        JobEvent::JobProgress {
            stage,
            percent,
            message,
            ..
        } => {
            info!(job_id = %job_id, %stage, percent = *percent, %message, event = event.event_type(), "job event");
        }
        JobEvent::JobCompleted { duration_ms, .. } => {
            info!(job_id = %job_id, duration_ms = *duration_ms, event = event.event_type(), "job event");
        }
        JobEvent::JobFailed { error, .. } => {
            warn!(job_id = %job_id, %error, event = event.event_type(), "job event");
        }
        JobEvent::JobRetrying {
            retry_count,
            delay_ms,
            ..
        } => {
            warn!(job_id = %job_id, retry_count = *retry_count, delay_ms = *delay_ms, event = event.event_type(), "job event");
        }
        JobEvent::JobCancelled { .. } => {
            info!(job_id = %job_id, event = event.event_type(), "job event");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use chrono::Utc;
    use replan_core::JobId;
    use replan_events::{EventBus, InMemoryEventBus};

    #[test]
    fn logger_drains_until_bus_drops() {
        let bus = Arc::new(InMemoryEventBus::new());
        let handle = spawn_event_logger(bus.subscribe());

        bus.publish(JobEvent::JobCreated {
            job_id: JobId::new(),
            job_type: "batch_optimization".to_string(),
            priority: "normal".to_string(),
            occurred_at: Utc::now(),
        })
        .unwrap();

        drop(bus);
        handle.join().unwrap();
    }
}
