//! Sweep phase.
//!
//! Both sweep modes first check that no marked object references an
//! unmarked one. Only then is anything freed or moved, so a failed sweep
//! leaves the heap exactly as `mark` left it.

use crate::config::SweepMode;
use crate::error::DanglingReferenceError;
use crate::heap::Heap;
use crate::object::HeapObject;
use crate::trace::{Trace, Visitor};
use crate::tracing::internal::{log_phase_end, log_phase_start, trace_phase};
use crate::tracing::GcPhase;
use crate::value::{ObjectId, Value};

/// Outcome of a successful sweep.
///
/// Every slot of the table as it stood before the sweep is counted exactly
/// once: `reclaimed + survivors + already_freed` equals that length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepResult {
    /// Slots released by this sweep. A logical sweep counts the objects it
    /// newly frees; a compacting sweep counts every slot it drops from the
    /// table, including slots an earlier logical sweep had freed.
    pub reclaimed: usize,
    /// Live objects left in the heap.
    pub survivors: usize,
    /// Slots that were already freed before this sweep and are still in the
    /// table. Always zero after a compacting sweep.
    pub already_freed: usize,
    /// Length of the object table after the sweep.
    pub heap_len: usize,
    /// Old-to-new id mapping, for compacting sweeps only.
    pub relocation: Option<Relocation>,
}

/// Maps pre-compaction ids to post-compaction ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    forward: Vec<Option<ObjectId>>,
}

impl Relocation {
    /// New id of the object formerly at `old`, or `None` if it was
    /// reclaimed (or `old` was never a valid id).
    #[must_use]
    pub fn get(&self, old: ObjectId) -> Option<ObjectId> {
        self.forward.get(old.index()).copied().flatten()
    }

    /// Translate a list of ids, typically the caller's roots, dropping any
    /// that did not survive.
    #[must_use]
    pub fn remap(&self, ids: &[ObjectId]) -> Vec<ObjectId> {
        ids.iter().filter_map(|&id| self.get(id)).collect()
    }

    /// Number of pre-compaction ids covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the object table was empty before compaction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// `(old, new)` pairs for every pre-compaction id, in old-id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, Option<ObjectId>)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .map(|(index, new)| (ObjectId::new(index), *new))
    }
}

/// Reclaim every unmarked object and reset all marks.
///
/// Sweeping a heap that was not marked this cycle reclaims every object;
/// running [`mark`](crate::mark) first is the caller's job.
///
/// # Errors
///
/// Returns [`DanglingReferenceError`] if a marked object references an
/// unmarked one. Nothing is freed, moved, or unmarked in that case.
pub fn sweep(heap: &mut Heap, mode: SweepMode) -> Result<SweepResult, DanglingReferenceError> {
    let _span = trace_phase(GcPhase::Sweep);
    log_phase_start(GcPhase::Sweep, heap.len());

    check_dangling(heap.objects())?;
    let result = match mode {
        SweepMode::Logical => sweep_in_place(heap),
        SweepMode::Compacting => sweep_compacting(heap),
    };

    #[cfg(feature = "paranoid-sweep")]
    verify_swept(heap, &result);

    log_phase_end(GcPhase::Sweep, result.reclaimed);
    Ok(result)
}

fn check_dangling(objects: &[HeapObject]) -> Result<(), DanglingReferenceError> {
    for (index, object) in objects.iter().enumerate() {
        if !object.is_marked() {
            continue;
        }
        let mut visitor = DanglingVisitor {
            objects,
            source: ObjectId::new(index),
            error: None,
        };
        object.trace(&mut visitor);
        if let Some(err) = visitor.error {
            return Err(err);
        }
    }
    Ok(())
}

/// Records the first reference from a marked object to an unmarked one.
struct DanglingVisitor<'a> {
    objects: &'a [HeapObject],
    source: ObjectId,
    error: Option<DanglingReferenceError>,
}

impl Visitor for DanglingVisitor<'_> {
    fn visit(&mut self, slot: usize, target: ObjectId) {
        if self.error.is_some() {
            return;
        }
        let live = self
            .objects
            .get(target.index())
            .is_some_and(HeapObject::is_marked);
        if !live {
            self.error = Some(DanglingReferenceError {
                source_object: self.source,
                slot,
                target,
            });
        }
    }
}

fn sweep_in_place(heap: &mut Heap) -> SweepResult {
    let mut reclaimed = 0;
    let mut survivors = 0;
    let mut already_freed = 0;

    for object in heap.objects_mut() {
        if object.is_marked() {
            object.set_marked(false);
            survivors += 1;
        } else if object.is_freed() {
            already_freed += 1;
        } else {
            object.set_freed(true);
            reclaimed += 1;
        }
    }

    SweepResult {
        reclaimed,
        survivors,
        already_freed,
        heap_len: heap.len(),
        relocation: None,
    }
}

fn sweep_compacting(heap: &mut Heap) -> SweepResult {
    let objects = std::mem::take(heap.objects_mut());
    let len_before = objects.len();

    let mut next = 0;
    let forward: Vec<Option<ObjectId>> = objects
        .iter()
        .map(|object| {
            object.is_marked().then(|| {
                let id = ObjectId::new(next);
                next += 1;
                id
            })
        })
        .collect();
    let relocation = Relocation { forward };

    let mut survivors = Vec::with_capacity(next);
    for mut object in objects.into_iter().filter(HeapObject::is_marked) {
        for value in object.fields_mut() {
            if let Value::Reference(target) = value {
                // check_dangling guarantees every target of a marked object survived.
                if let Some(new) = relocation.get(*target) {
                    *target = new;
                }
            }
        }
        object.set_marked(false);
        survivors.push(object);
    }

    *heap.objects_mut() = survivors;
    SweepResult {
        reclaimed: len_before - next,
        survivors: next,
        already_freed: 0,
        heap_len: next,
        relocation: Some(relocation),
    }
}

#[cfg(feature = "paranoid-sweep")]
fn verify_swept(heap: &Heap, result: &SweepResult) {
    debug_assert_eq!(heap.marked_count(), 0, "marks survived the sweep");
    debug_assert_eq!(heap.live_count(), result.survivors);
    debug_assert!(
        heap.validate().is_ok(),
        "sweep left an invalid reference: {:?}",
        heap.validate()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gc::mark;
    use crate::heap::HeapBuilder;

    fn two_islands() -> Heap {
        // 0 -> 1, 2 -> 3
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
    fn test_logical_sweep_flags_garbage() {
        let mut heap = two_islands();
        mark(&mut heap, &[ObjectId::new(0)]).unwrap();

        let result = sweep(&mut heap, SweepMode::Logical).unwrap();
        assert_eq!(result.reclaimed, 2);
        assert_eq!(result.survivors, 2);
        assert_eq!(result.already_freed, 0);
        assert_eq!(result.heap_len, 4);
        assert_eq!(result.relocation, None);

        assert!(heap.is_freed(ObjectId::new(2)));
        assert!(heap.is_freed(ObjectId::new(3)));
        assert!(!heap.is_freed(ObjectId::new(0)));
        assert_eq!(heap.marked_count(), 0);
    }

    #[test]
    fn test_logical_sweep_does_not_count_freed_twice() {
        let mut heap = two_islands();
        mark(&mut heap, &[ObjectId::new(0)]).unwrap();
        sweep(&mut heap, SweepMode::Logical).unwrap();

        mark(&mut heap, &[ObjectId::new(0)]).unwrap();
        let result = sweep(&mut heap, SweepMode::Logical).unwrap();
        assert_eq!(result.reclaimed, 0);
        assert_eq!(result.survivors, 2);
        assert_eq!(result.already_freed, 2);
    }

    #[test]
    fn test_compacting_sweep_builds_relocation() {
        let mut heap = two_islands();
        mark(&mut heap, &[ObjectId::new(0)]).unwrap();

        let result = sweep(&mut heap, SweepMode::Compacting).unwrap();
        let relocation = result.relocation.unwrap();
        assert_eq!(relocation.len(), 4);
        assert_eq!(relocation.get(ObjectId::new(0)), Some(ObjectId::new(0)));
        assert_eq!(relocation.get(ObjectId::new(1)), Some(ObjectId::new(1)));
        assert_eq!(relocation.get(ObjectId::new(2)), None);
        assert_eq!(relocation.get(ObjectId::new(3)), None);
        assert_eq!(relocation.get(ObjectId::new(40)), None);
    }

    #[test]
    fn test_compaction_drops_previously_freed_slots() {
        let mut heap = two_islands();
        mark(&mut heap, &[ObjectId::new(2)]).unwrap();
        sweep(&mut heap, SweepMode::Logical).unwrap();
        assert_eq!(heap.live_count(), 2);

        mark(&mut heap, &[ObjectId::new(2)]).unwrap();
        let result = sweep(&mut heap, SweepMode::Compacting).unwrap();
        assert_eq!(result.reclaimed, 2);
        assert_eq!(result.survivors, 2);
        assert_eq!(result.already_freed, 0);
        assert_eq!(result.heap_len, 2);
        assert_eq!(
            heap.get(ObjectId::new(0)).unwrap().fields()[0],
            Value::reference(1)
        );
    }

    #[test]
    fn test_dangling_reference_commits_nothing() {
        for mode in [SweepMode::Logical, SweepMode::Compacting] {
            let mut heap = two_islands();
            mark(&mut heap, &[ObjectId::new(0)]).unwrap();
            heap.set_field(ObjectId::new(1), 1, Value::reference(2)).unwrap();
            let before = heap.clone();

            let err = sweep(&mut heap, mode).unwrap_err();
            assert_eq!(
                err,
                DanglingReferenceError {
                    source_object: ObjectId::new(1),
                    slot: 1,
                    target: ObjectId::new(2),
                }
            );
            assert_eq!(heap, before);
        }
    }

    #[test]
    fn test_counts_cover_table_after_earlier_logical_sweep() {
        for mode in [SweepMode::Logical, SweepMode::Compacting] {
            let mut heap = two_islands();
            mark(&mut heap, &[ObjectId::new(0)]).unwrap();
            sweep(&mut heap, SweepMode::Logical).unwrap();

            mark(&mut heap, &[ObjectId::new(0)]).unwrap();
            let len_before = heap.len();
            let result = sweep(&mut heap, mode).unwrap();
            assert_eq!(
                result.reclaimed + result.survivors + result.already_freed,
                len_before,
                "{mode:?}"
            );
            assert_eq!(result.survivors, 2);
        }
    }

    #[test]
    fn test_relocation_is_empty_only_for_empty_table() {
        let mut heap = two_islands();
        mark(&mut heap, &[]).unwrap();
        let relocation = sweep(&mut heap, SweepMode::Compacting)
            .unwrap()
            .relocation
            .unwrap();
        assert!(heap.is_empty());
        assert!(!relocation.is_empty());

        let mut heap = Heap::default();
        let relocation = sweep(&mut heap, SweepMode::Compacting)
            .unwrap()
            .relocation
            .unwrap();
        assert!(relocation.is_empty());
    }

    #[test]
    fn test_relocation_remap_and_iter() {
        let relocation = Relocation {
            forward: vec![None, Some(ObjectId::new(0)), None, Some(ObjectId::new(1))],
        };
        assert_eq!(
            relocation.remap(&[ObjectId::new(3), ObjectId::new(0), ObjectId::new(1)]),
            vec![ObjectId::new(1), ObjectId::new(0)]
        );
        assert_eq!(relocation.iter().filter(|(_, new)| new.is_some()).count(), 2);
    }
}
