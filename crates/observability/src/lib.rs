//! `replan-observability`: shared tracing setup and job-event logging.

pub mod events;
pub mod tracing;

pub use events::spawn_event_logger;

/// Initialize process-wide observability.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
