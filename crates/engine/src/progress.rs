//! Progress reporting seam between long-running pipelines and their caller
//! (normally the job scheduler).

/// Receives incremental progress from a running pipeline.
///
/// Implementations must tolerate repeated reports at the same percentage;
/// pipelines guarantee percentages are non-decreasing within one run.
pub trait ProgressSink: Send + Sync {
    fn report(&self, stage: &str, percent: u8, message: &str);
}

/// Sink that discards everything; for synchronous/library callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _stage: &str, _percent: u8, _message: &str) {}
}
