//! Collector tracing support.
//!
//! When the `tracing` feature is enabled, this module provides structured
//! tracing spans and events for collection cycles. Without it every helper
//! is a no-op.

/// Collection phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcPhase {
    /// Validate the heap and the roots, reset mark flags.
    Clear,
    /// Trace the live object graph.
    Mark,
    /// Reclaim unmarked objects.
    Sweep,
}

#[cfg(feature = "tracing")]
pub mod internal {
    use std::sync::atomic::{AtomicU64, Ordering};
    use tracing::{span, Level};

    use super::GcPhase;

    /// Stable identifier for a collection cycle.
    ///
    /// Correlates the spans and events of one `collect` call. Starts at 1
    /// and increases monotonically per process.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcId(pub u64);

    static NEXT_GC_ID: AtomicU64 = AtomicU64::new(1);

    /// Generate the next unique cycle ID.
    pub fn next_gc_id() -> GcId {
        GcId(NEXT_GC_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a span for the entire collection cycle.
    pub fn trace_gc_collection(
        sweep_mode: &str,
        gc_id: GcId,
        heap_len: usize,
    ) -> span::EnteredSpan {
        span!(
            Level::DEBUG,
            "gc_collect",
            sweep_mode = sweep_mode,
            gc_id = gc_id.0,
            heap_len
        )
        .entered()
    }

    /// Create a span for a phase.
    pub fn trace_phase(phase: GcPhase) -> span::EnteredSpan {
        span!(Level::DEBUG, "gc_phase", phase = ?phase).entered()
    }

    /// Log the start of a phase with the number of objects it will look at.
    pub fn log_phase_start(phase: GcPhase, objects: usize) {
        tracing::debug!(phase = ?phase, objects, "phase_start");
    }

    /// Log the end of a phase with the number of objects it affected.
    pub fn log_phase_end(phase: GcPhase, objects: usize) {
        tracing::debug!(phase = ?phase, objects, "phase_end");
    }

    /// Log a cycle that failed.
    pub fn log_cycle_error(error: &crate::CollectorError) {
        tracing::debug!(%error, "gc_collect_failed");
    }
}

#[cfg(not(feature = "tracing"))]
pub mod internal {
    use super::GcPhase;

    /// Stub type when tracing is disabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcId(pub u64);

    /// Stub function when tracing is disabled.
    pub const fn next_gc_id() -> GcId {
        GcId(0)
    }

    /// Stub function when tracing is disabled.
    pub const fn trace_gc_collection(_sweep_mode: &str, _gc_id: GcId, _heap_len: usize) {}

    /// Stub function when tracing is disabled.
    pub const fn trace_phase(_phase: GcPhase) {}

    /// Stub function when tracing is disabled.
    pub const fn log_phase_start(_phase: GcPhase, _objects: usize) {}

    /// Stub function when tracing is disabled.
    pub const fn log_phase_end(_phase: GcPhase, _objects: usize) {}

    /// Stub function when tracing is disabled.
    pub const fn log_cycle_error(_error: &crate::CollectorError) {}
}
