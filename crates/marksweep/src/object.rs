//! A single heap allocation.

use crate::trace::{CollectEdges, Trace};
use crate::value::{ObjectId, Value};

/// One object in the heap.
///
/// The number of fields is fixed when the object is created. The `marked`
/// and `freed` flags belong to the collector and can only be read from
/// outside the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapObject {
    marked: bool,
    freed: bool,
    fields: Box<[Value]>,
}

impl HeapObject {
    /// Create an unmarked, live object holding `fields`.
    #[must_use]
    pub fn new(fields: impl Into<Box<[Value]>>) -> Self {
        Self {
            marked: false,
            freed: false,
            fields: fields.into(),
        }
    }

    /// Create an object with `slots` fields, all `Immediate(0)`.
    #[must_use]
    pub fn with_slots(slots: usize) -> Self {
        Self::new(vec![Value::default(); slots])
    }

    /// Whether the collector has marked this object in the current cycle.
    #[must_use]
    pub const fn is_marked(&self) -> bool {
        self.marked
    }

    /// Whether a logical sweep has reclaimed this slot.
    #[must_use]
    pub const fn is_freed(&self) -> bool {
        self.freed
    }

    /// The object's fields.
    #[must_use]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Number of fields.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.fields.len()
    }

    /// Targets of every reference field, in field order.
    #[must_use]
    pub fn references(&self) -> Vec<ObjectId> {
        let mut edges = CollectEdges::default();
        self.trace(&mut edges);
        edges.edges.into_iter().map(|(_, target)| target).collect()
    }

    pub(crate) const fn set_marked(&mut self, marked: bool) {
        self.marked = marked;
    }

    pub(crate) const fn set_freed(&mut self, freed: bool) {
        self.freed = freed;
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Value] {
        &mut self.fields
    }

    /// Put a freed slot back into service with new contents.
    pub(crate) fn reinitialize(&mut self, fields: Box<[Value]>) {
        self.marked = false;
        self.freed = false;
        self.fields = fields;
    }
}
