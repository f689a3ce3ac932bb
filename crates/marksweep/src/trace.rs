//! Trace trait and Visitor pattern for walking object references.
//!
//! Every pass over the object graph (validation, marking, the dangling
//! reference check before a sweep) is a `Visitor` fed by `Trace::trace`.

use crate::object::HeapObject;
use crate::value::{ObjectId, Value};

// ============================================================================
// Core Traits
// ============================================================================

/// A type whose outgoing references can be enumerated.
///
/// Implementations must report every `Value::Reference` they contain, in
/// field order. Missing one makes the collector treat a live object as
/// garbage.
pub trait Trace {
    /// Visit all references contained within this value.
    fn trace(&self, visitor: &mut impl Visitor);
}

/// A visitor that receives each reference found while tracing.
pub trait Visitor {
    /// Called once per `Reference` field. `slot` is the field's index
    /// within its object.
    fn visit(&mut self, slot: usize, target: ObjectId);
}

// ============================================================================
// Implementations
// ============================================================================

impl Trace for [Value] {
    fn trace(&self, visitor: &mut impl Visitor) {
        for (slot, value) in self.iter().enumerate() {
            match *value {
                Value::Reference(target) => visitor.visit(slot, target),
                Value::Immediate(_) => {}
            }
        }
    }
}

impl Trace for HeapObject {
    fn trace(&self, visitor: &mut impl Visitor) {
        self.fields().trace(visitor);
    }
}

/// A visitor that collects every visited reference.
///
/// Handy for callers that want the edges of an object as a list.
#[derive(Debug, Default)]
pub struct CollectEdges {
    /// `(slot, target)` pairs, in visit order.
    pub edges: Vec<(usize, ObjectId)>,
}

impl Visitor for CollectEdges {
    fn visit(&mut self, slot: usize, target: ObjectId) {
        self.edges.push((slot, target));
    }
}
