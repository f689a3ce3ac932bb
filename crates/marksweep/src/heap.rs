//! The object heap.
//!
//! A `Heap` is a dense table of [`HeapObject`]s addressed by [`ObjectId`].
//! References between objects are ids, so the table is the only owner of
//! any object and cyclic graphs need no special ownership handling.
//!
//! Every public constructor and mutator keeps the heap *valid*: each
//! reference held by a live object points at an in-bounds, live slot. The
//! collector relies on this and does no bounds checking of its own while
//! tracing.

use crate::error::{BadTarget, InvalidReferenceError};
use crate::object::HeapObject;
use crate::trace::{Trace, Visitor};
use crate::value::{ObjectId, Value};

/// Number of fields given to each object by [`HeapBuilder`] unless
/// configured otherwise.
pub const DEFAULT_SLOTS: usize = 10;

/// Number of leading objects used as roots by [`Heap::leading_roots`] callers
/// that do not pick their own count.
pub const DEFAULT_ROOTS: usize = 10;

/// A dense, index-addressed table of objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    /// Build a heap from `objects`, rejecting it if any reference is out of
    /// bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvalidReferenceError`] found, in object then
    /// field order.
    pub fn new(objects: Vec<HeapObject>) -> Result<Self, InvalidReferenceError> {
        let heap = Self { objects };
        heap.validate()?;
        Ok(heap)
    }

    /// Check that every reference held by a live object targets an
    /// in-bounds, live slot.
    ///
    /// Freed slots are not inspected: their contents are dead.
    ///
    /// # Errors
    ///
    /// Returns the first offending reference, in object then field order.
    pub fn validate(&self) -> Result<(), InvalidReferenceError> {
        for (index, object) in self.objects.iter().enumerate() {
            if object.is_freed() {
                continue;
            }
            check_fields(&self.objects, ObjectId::new(index), object.fields())?;
        }
        Ok(())
    }

    /// Number of slots in the table, freed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the table has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of slots that are not freed.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.objects.iter().filter(|o| !o.is_freed()).count()
    }

    /// Number of objects marked in the current cycle.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_marked()).count()
    }

    /// The object at `id`, freed or not.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.objects.get(id.index())
    }

    /// Whether `id` is in bounds and marked.
    #[must_use]
    pub fn is_marked(&self, id: ObjectId) -> bool {
        self.get(id).is_some_and(HeapObject::is_marked)
    }

    /// Whether `id` is in bounds and freed.
    #[must_use]
    pub fn is_freed(&self, id: ObjectId) -> bool {
        self.get(id).is_some_and(HeapObject::is_freed)
    }

    /// Ids of all marked objects, ascending.
    #[must_use]
    pub fn marked_ids(&self) -> Vec<ObjectId> {
        self.iter()
            .filter(|(_, o)| o.is_marked())
            .map(|(id, _)| id)
            .collect()
    }

    /// All slots with their ids, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &HeapObject)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (ObjectId::new(index), object))
    }

    /// The first `count` ids (or all of them, for a smaller heap).
    #[must_use]
    pub fn leading_roots(&self, count: usize) -> Vec<ObjectId> {
        (0..count.min(self.len())).map(ObjectId::new).collect()
    }

    /// Allocate a new object between collection cycles.
    ///
    /// Reuses the lowest slot freed by a logical sweep, otherwise appends to
    /// the table.
    ///
    /// # Errors
    ///
    /// Rejects `fields` if any reference targets an out-of-bounds or freed
    /// slot. Nothing is allocated in that case.
    pub fn allocate(
        &mut self,
        fields: impl Into<Box<[Value]>>,
    ) -> Result<ObjectId, InvalidReferenceError> {
        let fields = fields.into();
        let reuse = self.objects.iter().position(HeapObject::is_freed);
        let id = ObjectId::new(reuse.unwrap_or(self.objects.len()));
        check_fields(&self.objects, id, &fields)?;

        match reuse {
            Some(index) => self.objects[index].reinitialize(fields),
            None => self.objects.push(HeapObject::new(fields)),
        }
        Ok(id)
    }

    /// Overwrite one field of a live object, returning the previous value.
    ///
    /// Intended for use between collection cycles. Writing between `mark`
    /// and `sweep` is not prevented, and a sweep that then finds a marked
    /// object pointing at an unmarked one reports a
    /// [`DanglingReferenceError`](crate::DanglingReferenceError).
    ///
    /// # Errors
    ///
    /// Rejects a reference to an out-of-bounds or freed slot, leaving the
    /// field unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live object or `slot` is not one of its
    /// fields.
    pub fn set_field(
        &mut self,
        id: ObjectId,
        slot: usize,
        value: Value,
    ) -> Result<Value, InvalidReferenceError> {
        assert!(
            self.get(id).is_some_and(|o| !o.is_freed()),
            "set_field on {id}, which is not a live object"
        );
        if let Value::Reference(target) = value {
            check_target(&self.objects, target).map_err(|kind| InvalidReferenceError {
                source_object: id,
                slot,
                target,
                kind,
            })?;
        }
        let field = &mut self.objects[id.index()].fields_mut()[slot];
        Ok(std::mem::replace(field, value))
    }

    pub(crate) fn objects(&self) -> &[HeapObject] {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut Vec<HeapObject> {
        &mut self.objects
    }

    /// Check `id` against the table, as roots are checked before marking.
    pub(crate) fn check_target(&self, id: ObjectId) -> Result<(), BadTarget> {
        check_target(&self.objects, id)
    }
}

fn check_target(objects: &[HeapObject], id: ObjectId) -> Result<(), BadTarget> {
    match objects.get(id.index()) {
        None => Err(BadTarget::OutOfBounds { len: objects.len() }),
        Some(object) if object.is_freed() => Err(BadTarget::Freed),
        Some(_) => Ok(()),
    }
}

fn check_fields(
    objects: &[HeapObject],
    source: ObjectId,
    fields: &[Value],
) -> Result<(), InvalidReferenceError> {
    let mut visitor = ValidateVisitor {
        objects,
        source,
        error: None,
    };
    fields.trace(&mut visitor);
    visitor.error.map_or(Ok(()), Err)
}

/// Records the first reference that fails [`check_target`].
struct ValidateVisitor<'a> {
    objects: &'a [HeapObject],
    source: ObjectId,
    error: Option<InvalidReferenceError>,
}

impl Visitor for ValidateVisitor<'_> {
    fn visit(&mut self, slot: usize, target: ObjectId) {
        if self.error.is_some() {
            return;
        }
        if let Err(kind) = check_target(self.objects, target) {
            self.error = Some(InvalidReferenceError {
                source_object: self.source,
                slot,
                target,
                kind,
            });
        }
    }
}

// ============================================================================
// HeapBuilder
// ============================================================================

/// Builds heaps whose objects all have the same number of fields.
///
/// ```
/// use marksweep::{HeapBuilder, Value};
///
/// let heap = HeapBuilder::new()
///     .slots(2)
///     .object([Value::reference(1)])
///     .object([Value::Immediate(5)])
///     .build()
///     .unwrap();
/// assert_eq!(heap.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct HeapBuilder {
    slots: usize,
    objects: Vec<HeapObject>,
}

impl Default for HeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapBuilder {
    /// A builder producing objects of [`DEFAULT_SLOTS`] fields.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            objects: Vec::new(),
        }
    }

    /// Set the number of fields per object for objects added afterwards.
    #[must_use]
    pub fn slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    /// Add an object. Fields past the end of `values` are `Immediate(0)`.
    ///
    /// # Panics
    ///
    /// Panics if `values` has more entries than the configured slot count.
    #[must_use]
    pub fn object(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        let mut fields: Vec<Value> = values.into_iter().collect();
        assert!(
            fields.len() <= self.slots,
            "object has {} values but only {} slots",
            fields.len(),
            self.slots
        );
        fields.resize(self.slots, Value::default());
        self.objects.push(HeapObject::new(fields));
        self
    }

    /// Add `count` objects holding only `Immediate(0)`.
    #[must_use]
    pub fn empty_objects(mut self, count: usize) -> Self {
        let slots = self.slots;
        self.objects
            .extend(std::iter::repeat_with(|| HeapObject::with_slots(slots)).take(count));
        self
    }

    /// Validate and return the heap.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-bounds reference, see [`Heap::new`].
    pub fn build(self) -> Result<Heap, InvalidReferenceError> {
        Heap::new(self.objects)
    }

    /// Generate a heap of `size` objects with seeded random edges.
    ///
    /// Every field starts as `Immediate(0)` and independently becomes a
    /// reference to a uniformly chosen object with probability one half.
    /// Any objects already added to the builder are discarded.
    #[cfg(feature = "random")]
    #[must_use]
    pub fn random(self, size: usize, seed: u64) -> Heap {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(seed);
        let objects = (0..size)
            .map(|_| {
                let fields: Vec<Value> = (0..self.slots)
                    .map(|_| {
                        if rng.random_bool(0.5) {
                            Value::reference(rng.random_range(0..size))
                        } else {
                            Value::default()
                        }
                    })
                    .collect();
                HeapObject::new(fields)
            })
            .collect();

        // Every generated target is below `size`.
        Heap { objects }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_object_heap() -> Heap {
        HeapBuilder::new()
            .slots(2)
            .object([Value::reference(1)])
            .object([Value::Immediate(5)])
            .object([Value::reference(3)])
            .empty_objects(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_reference() {
        let err = HeapBuilder::new()
            .slots(1)
            .object([Value::reference(99)])
            .empty_objects(3)
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            InvalidReferenceError {
                source_object: ObjectId::new(0),
                slot: 0,
                target: ObjectId::new(99),
                kind: BadTarget::OutOfBounds { len: 4 },
            }
        );
    }

    #[test]
    fn test_validate_reports_first_bad_field() {
        let objects = vec![
            HeapObject::new(vec![Value::Immediate(0)]),
            HeapObject::new(vec![Value::reference(0), Value::reference(5), Value::reference(6)]),
        ];
        let err = Heap::new(objects).unwrap_err();
        assert_eq!(err.source_object, ObjectId::new(1));
        assert_eq!(err.slot, 1);
        assert_eq!(err.target, ObjectId::new(5));
    }

    #[test]
    fn test_validate_ignores_freed_slots() {
        let mut heap = four_object_heap();
        heap.objects_mut()[2].set_freed(true);
        heap.objects_mut()[2].fields_mut()[0] = Value::reference(1000);
        assert!(heap.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reference_to_freed_slot() {
        let mut heap = four_object_heap();
        heap.objects_mut()[1].set_freed(true);
        let err = heap.validate().unwrap_err();
        assert_eq!(err.source_object, ObjectId::new(0));
        assert_eq!(err.kind, BadTarget::Freed);
    }

    #[test]
    fn test_empty_heap() {
        let heap = Heap::new(Vec::new()).unwrap();
        assert!(heap.is_empty());
        assert_eq!(heap.live_count(), 0);
        assert!(heap.leading_roots(DEFAULT_ROOTS).is_empty());
    }

    #[test]
    fn test_leading_roots_clamped_to_len() {
        let heap = four_object_heap();
        assert_eq!(heap.leading_roots(DEFAULT_ROOTS).len(), 4);
        assert_eq!(
            heap.leading_roots(2),
            vec![ObjectId::new(0), ObjectId::new(1)]
        );
    }

    #[test]
    fn test_allocate_appends() {
        let mut heap = four_object_heap();
        let id = heap
            .allocate(vec![Value::reference(0), Value::Immediate(1)])
            .unwrap();
        assert_eq!(id, ObjectId::new(4));
        assert_eq!(heap.len(), 5);
    }

    #[test]
    fn test_allocate_reuses_lowest_freed_slot() {
        let mut heap = four_object_heap();
        heap.objects_mut()[3].set_freed(true);
        heap.objects_mut()[2].set_freed(true);

        let id = heap.allocate(vec![Value::Immediate(8)]).unwrap();
        assert_eq!(id, ObjectId::new(2));
        assert!(!heap.is_freed(id));
        assert_eq!(heap.len(), 4);
        assert_eq!(heap.live_count(), 3);
    }

    #[test]
    fn test_allocate_rejects_bad_reference() {
        let mut heap = four_object_heap();
        let err = heap.allocate(vec![Value::reference(4)]).unwrap_err();
        assert_eq!(err.source_object, ObjectId::new(4));
        assert_eq!(err.kind, BadTarget::OutOfBounds { len: 4 });
        assert_eq!(heap.len(), 4);
    }

    #[test]
    fn test_set_field() {
        let mut heap = four_object_heap();
        let old = heap
            .set_field(ObjectId::new(3), 1, Value::reference(0))
            .unwrap();
        assert_eq!(old, Value::Immediate(0));
        assert_eq!(
            heap.get(ObjectId::new(3)).unwrap().fields()[1],
            Value::reference(0)
        );

        let err = heap
            .set_field(ObjectId::new(3), 1, Value::reference(4))
            .unwrap_err();
        assert_eq!(err.kind, BadTarget::OutOfBounds { len: 4 });
        assert_eq!(
            heap.get(ObjectId::new(3)).unwrap().fields()[1],
            Value::reference(0)
        );
    }

    #[test]
    #[should_panic(expected = "not a live object")]
    fn test_set_field_on_missing_object_panics() {
        let mut heap = four_object_heap();
        let _ = heap.set_field(ObjectId::new(10), 0, Value::Immediate(1));
    }

    #[test]
    fn test_builder_pads_fields() {
        let heap = HeapBuilder::new()
            .slots(3)
            .object([Value::Immediate(1)])
            .build()
            .unwrap();
        assert_eq!(
            heap.get(ObjectId::new(0)).unwrap().fields(),
            &[Value::Immediate(1), Value::Immediate(0), Value::Immediate(0)]
        );
    }

    #[test]
    #[should_panic(expected = "only 1 slots")]
    fn test_builder_rejects_too_many_values() {
        let _ = HeapBuilder::new()
            .slots(1)
            .object([Value::Immediate(1), Value::Immediate(2)]);
    }

    #[cfg(feature = "random")]
    #[test]
    fn test_random_heap_is_valid_and_seeded() {
        let a = HeapBuilder::new().random(200, 7);
        let b = HeapBuilder::new().random(200, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 200);
        assert!(a.validate().is_ok());
        assert!(a.iter().all(|(_, o)| o.slots() == DEFAULT_SLOTS));
        assert!(a.iter().any(|(_, o)| !o.references().is_empty()));
    }
}
