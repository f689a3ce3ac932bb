//! Mark-sweep collection.
//!
//! A cycle runs three phases on the calling thread, stop-the-world:
//!
//! 1. **Clear**: validate the heap (optional) and the roots.
//! 2. **Mark**: compute the set reachable from the roots.
//! 3. **Sweep**: free or compact away everything else, reset marks.
//!
//! [`collect`] and [`Collector::collect`] run a whole cycle. [`mark`] and
//! [`sweep`] are public for tests and instrumentation that need to look at
//! the heap between phases.

mod bitmap;
mod marker;
mod sweeper;

pub use bitmap::MarkBitmap;
pub use marker::mark;
pub use sweeper::{sweep, Relocation, SweepResult};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::heap::Heap;
use crate::tracing::internal::{
    log_cycle_error, log_phase_end, log_phase_start, next_gc_id, trace_gc_collection, trace_phase,
};
use crate::tracing::GcPhase;
use crate::value::ObjectId;

use self::marker::{check_roots, mark_roots};

/// Runs collection cycles with a fixed configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collector {
    config: CollectorConfig,
}

impl Collector {
    /// Create a collector with the given configuration.
    #[must_use]
    pub const fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run one full cycle: validate, mark from `roots`, sweep.
    ///
    /// # Errors
    ///
    /// Fails without modifying the heap if the heap holds an invalid
    /// reference (when `verify_heap` is on) or a root is invalid.
    /// [`CollectorError::DanglingReference`] cannot come out of this call:
    /// the cycle marks immediately before sweeping, so every target of a
    /// marked object is marked too.
    pub fn collect(
        &self,
        heap: &mut Heap,
        roots: &[ObjectId],
    ) -> Result<SweepResult, CollectorError> {
        let _span =
            trace_gc_collection(self.config.sweep_mode.as_str(), next_gc_id(), heap.len());
        self.run_cycle(heap, roots).inspect_err(log_cycle_error)
    }

    fn run_cycle(
        &self,
        heap: &mut Heap,
        roots: &[ObjectId],
    ) -> Result<SweepResult, CollectorError> {
        self.clear(heap, roots)?;
        mark_roots(heap, roots);
        Ok(sweep(heap, self.config.sweep_mode)?)
    }

    /// Verify the heap (if configured) and the roots. Changes nothing.
    fn clear(&self, heap: &Heap, roots: &[ObjectId]) -> Result<(), CollectorError> {
        let _span = trace_phase(GcPhase::Clear);
        log_phase_start(GcPhase::Clear, heap.len());

        if self.config.verify_heap {
            heap.validate()?;
        }
        check_roots(heap, roots)?;

        log_phase_end(GcPhase::Clear, roots.len());
        Ok(())
    }
}

/// Run one full cycle with the default configuration: heap verification
/// and a logical (non-moving) sweep.
///
/// # Errors
///
/// See [`Collector::collect`].
pub fn collect(heap: &mut Heap, roots: &[ObjectId]) -> Result<SweepResult, CollectorError> {
    Collector::default().collect(heap, roots)
}
