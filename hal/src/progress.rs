//! The optional progress-animation capability.
//!
//! A hardware device ticks a display animation every 20 acks and at phase boundaries; this is a
//! soft obligation (a caller may substitute a throttled callback instead), so the default
//! implementation just logs at `log::trace!` rather than requiring every caller to wire up a real
//! display.

/// Called by the state machine's dispatch loop to report liveness during a long signing session.
pub trait ProgressSink {
    /// Called after every `tick_every` acks (see `txsigning::state::PROGRESS_TICK_ACKS`)
    /// and at each stage-boundary transition.
    fn tick(&mut self, acks_processed: u32);
}

/// The default `ProgressSink`: emits a trace-level log line and renders nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn tick(&mut self, acks_processed: u32) {
        log::trace!("signing session progress: {} acks processed", acks_processed);
    }
}
