//! Mark bitmap used while tracing.
//!
//! Marking records liveness here first, one bit per object, and only copies
//! the result into the objects' `marked` flags once tracing has finished.

/// A fixed-capacity bitset with a running count of set bits.
///
/// # Example
///
/// ```
/// use marksweep::gc::MarkBitmap;
///
/// let mut bitmap = MarkBitmap::new(100);
/// assert!(!bitmap.is_marked(0));
///
/// assert!(bitmap.mark(0));
/// assert!(!bitmap.mark(0));
/// assert!(bitmap.is_marked(0));
/// assert_eq!(bitmap.marked_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MarkBitmap {
    words: Vec<u64>,
    capacity: usize,
    marked_count: usize,
}

impl MarkBitmap {
    /// Create a bitmap for `capacity` objects, all unmarked.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
            marked_count: 0,
        }
    }

    /// Number of objects the bitmap covers.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of marked objects.
    #[must_use]
    pub const fn marked_count(&self) -> usize {
        self.marked_count
    }

    /// Mark `index`. Returns `true` if it was not already marked.
    ///
    /// # Panics
    ///
    /// Panics if `index >= capacity`.
    pub fn mark(&mut self, index: usize) -> bool {
        assert!(index < self.capacity, "mark index {index} out of bounds");
        let mask = 1u64 << (index % 64);
        let word = &mut self.words[index / 64];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.marked_count += 1;
        true
    }

    /// Whether `index` is marked. Out-of-range indices are unmarked.
    #[must_use]
    pub fn is_marked(&self, index: usize) -> bool {
        index < self.capacity && (self.words[index / 64] >> (index % 64)) & 1 != 0
    }
}
