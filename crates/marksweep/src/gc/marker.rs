//! Mark phase.
//!
//! Traversal uses an explicit worklist, never recursion, so the depth of the
//! object graph does not bound anything but the worklist's length. An object
//! is marked in the bitmap when it is first discovered and pushed exactly
//! once, which keeps the worklist no longer than the heap.

use crate::error::InvalidRootError;
use crate::heap::Heap;
use crate::object::HeapObject;
use crate::trace::{Trace, Visitor};
use crate::tracing::internal::{log_phase_end, log_phase_start, trace_phase};
use crate::tracing::GcPhase;
use crate::value::ObjectId;

use super::bitmap::MarkBitmap;

/// Mark every object reachable from `roots`.
///
/// Previous marks are discarded first, so calling this twice in a row leaves
/// the same marked set as calling it once. Duplicate roots and an empty root
/// set are fine.
///
/// # Errors
///
/// Fails if any root is out of bounds or names a freed slot. All roots are
/// checked before any mark flag changes, so on error the heap is untouched.
pub fn mark(heap: &mut Heap, roots: &[ObjectId]) -> Result<(), InvalidRootError> {
    {
        let _span = trace_phase(GcPhase::Clear);
        log_phase_start(GcPhase::Clear, roots.len());
        check_roots(heap, roots)?;
        log_phase_end(GcPhase::Clear, roots.len());
    }
    mark_roots(heap, roots);
    Ok(())
}

/// Mark from roots already accepted by [`check_roots`], returning the number
/// of marked objects.
pub(crate) fn mark_roots(heap: &mut Heap, roots: &[ObjectId]) -> usize {
    let _span = trace_phase(GcPhase::Mark);
    log_phase_start(GcPhase::Mark, roots.len());

    let bitmap = trace_from_roots(heap.objects(), roots);
    for (index, object) in heap.objects_mut().iter_mut().enumerate() {
        object.set_marked(bitmap.is_marked(index));
    }

    log_phase_end(GcPhase::Mark, bitmap.marked_count());
    bitmap.marked_count()
}

/// Fail on the first root that is out of bounds or names a freed slot.
pub(crate) fn check_roots(heap: &Heap, roots: &[ObjectId]) -> Result<(), InvalidRootError> {
    for &root in roots {
        heap.check_target(root).map_err(|kind| InvalidRootError { root, kind })?;
    }
    Ok(())
}

/// Compute the reachable set without touching the objects.
fn trace_from_roots(objects: &[HeapObject], roots: &[ObjectId]) -> MarkBitmap {
    let mut bitmap = MarkBitmap::new(objects.len());
    let mut worklist = Vec::with_capacity(roots.len());

    for &root in roots {
        if bitmap.mark(root.index()) {
            worklist.push(root);
        }
    }

    while let Some(id) = worklist.pop() {
        let mut visitor = MarkVisitor {
            bitmap: &mut bitmap,
            worklist: &mut worklist,
        };
        objects[id.index()].trace(&mut visitor);
    }

    bitmap
}

/// Marks newly discovered objects and queues them for tracing.
struct MarkVisitor<'a> {
    bitmap: &'a mut MarkBitmap,
    worklist: &'a mut Vec<ObjectId>,
}

impl Visitor for MarkVisitor<'_> {
    fn visit(&mut self, _slot: usize, target: ObjectId) {
        if self.bitmap.mark(target.index()) {
            self.worklist.push(target);
        }
    }
}
