//! Collector configuration.

/// How unmarked objects are reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SweepMode {
    /// Flag garbage slots as freed and leave every object where it is.
    ///
    /// Ids held by the caller stay valid across collections.
    #[default]
    Logical,
    /// Repack survivors at the front of the table in their original order
    /// and rewrite references. The sweep returns a [`Relocation`] for
    /// translating ids held outside the heap.
    ///
    /// [`Relocation`]: crate::Relocation
    Compacting,
}

impl SweepMode {
    /// Short name used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Logical => "logical",
            Self::Compacting => "compacting",
        }
    }
}

/// Settings for a [`Collector`](crate::Collector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Sweep policy applied after marking.
    pub sweep_mode: SweepMode,
    /// Run [`Heap::validate`](crate::Heap::validate) before marking.
    ///
    /// Heaps only reachable through this crate's API are always valid, so
    /// turning this off skips a full pass over the heap.
    pub verify_heap: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorConfig {
    /// Logical sweep with heap verification.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sweep_mode: SweepMode::Logical,
            verify_heap: true,
        }
    }

    /// Same settings with a different sweep mode.
    #[must_use]
    pub const fn with_sweep_mode(mut self, sweep_mode: SweepMode) -> Self {
        self.sweep_mode = sweep_mode;
        self
    }

    /// Same settings with heap verification turned on or off.
    #[must_use]
    pub const fn with_verify_heap(mut self, verify_heap: bool) -> Self {
        self.verify_heap = verify_heap;
        self
    }
}
