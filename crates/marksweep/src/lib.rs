//! A stop-the-world mark-sweep collector over an index-addressed heap.
//!
//! `marksweep` models a heap as a dense table of objects. Each object has a
//! fixed number of fields, and each field is either an immediate integer or
//! a [`Value::Reference`] to another object by [`ObjectId`]. Because
//! references are indices rather than pointers, arbitrary graphs (cycles
//! included) are plain data.
//!
//! A collection cycle marks everything reachable from a set of roots with an
//! explicit worklist, then sweeps the rest in one of two ways:
//!
//! - **Logical** ([`SweepMode::Logical`], the default): garbage slots are
//!   flagged as freed and later reused by [`Heap::allocate`]. No id changes.
//! - **Compacting** ([`SweepMode::Compacting`]): survivors are repacked in
//!   order and every reference is rewritten. The returned [`Relocation`]
//!   translates ids the caller holds outside the heap.
//!
//! # Quick Start
//!
//! ```
//! use marksweep::{collect, HeapBuilder, ObjectId, Value};
//!
//! // 0 -> 1, 2 -> 3
//! let mut heap = HeapBuilder::new()
//!     .slots(2)
//!     .object([Value::reference(1)])
//!     .object([Value::Immediate(5)])
//!     .object([Value::reference(3)])
//!     .empty_objects(1)
//!     .build()?;
//!
//! let result = collect(&mut heap, &[ObjectId::new(0)])?;
//! assert_eq!(result.reclaimed, 2);
//! assert!(heap.is_freed(ObjectId::new(2)));
//! # Ok::<(), marksweep::CollectorError>(())
//! ```
//!
//! # Compaction
//!
//! ```
//! use marksweep::{Collector, CollectorConfig, HeapBuilder, ObjectId, SweepMode, Value};
//!
//! let mut heap = HeapBuilder::new()
//!     .slots(1)
//!     .empty_objects(1)
//!     .object([Value::reference(2)])
//!     .empty_objects(1)
//!     .build()?;
//!
//! let collector = Collector::new(CollectorConfig::new().with_sweep_mode(SweepMode::Compacting));
//! let result = collector.collect(&mut heap, &[ObjectId::new(1)])?;
//!
//! assert_eq!(heap.len(), 2);
//! let roots = result.relocation.unwrap().remap(&[ObjectId::new(1)]);
//! assert_eq!(roots, [ObjectId::new(0)]);
//! assert_eq!(heap.get(roots[0]).unwrap().fields(), &[Value::reference(1)]);
//! # Ok::<(), marksweep::CollectorError>(())
//! ```
//!
//! # Threading
//!
//! Collection runs to completion on the calling thread. Every phase takes
//! `&mut Heap`, so nothing else can touch the heap while it runs.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod heap;
mod object;
mod trace;
mod tracing;
mod value;

/// Collector phases and their building blocks.
///
/// Most users only need [`collect`] or [`Collector`].
pub mod gc;

// Re-export public API
pub use config::{CollectorConfig, SweepMode};
pub use error::{
    BadTarget, CollectorError, DanglingReferenceError, InvalidReferenceError, InvalidRootError,
};
pub use gc::{collect, mark, sweep, Collector, Relocation, SweepResult};
pub use heap::{Heap, HeapBuilder, DEFAULT_ROOTS, DEFAULT_SLOTS};
pub use object::HeapObject;
pub use trace::{CollectEdges, Trace, Visitor};
pub use value::{ObjectId, Value};
