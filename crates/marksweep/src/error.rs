//! Collector errors.
//!
//! Each phase has its own error type so callers of `mark` or `sweep` only
//! match on what that phase can report. `CollectorError` joins them for
//! `collect`.

use thiserror::Error;

use crate::value::ObjectId;

/// Why an id was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadTarget {
    /// The id is not below the heap length.
    OutOfBounds {
        /// Heap length at the time of the check.
        len: usize,
    },
    /// The id names a slot reclaimed by a logical sweep.
    Freed,
}

impl std::fmt::Display for BadTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds { len } => write!(f, "out of bounds for heap of length {len}"),
            Self::Freed => f.write_str("a freed slot"),
        }
    }
}

/// A reference field points outside the heap or at a freed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("object {source_object} field {slot} references {target}, which is {kind}")]
pub struct InvalidReferenceError {
    /// Object holding the bad reference.
    pub source_object: ObjectId,
    /// Field index within that object.
    pub slot: usize,
    /// The referenced id.
    pub target: ObjectId,
    /// What is wrong with `target`.
    pub kind: BadTarget,
}

/// A root id points outside the heap or at a freed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("root {root} is {kind}")]
pub struct InvalidRootError {
    /// The rejected root.
    pub root: ObjectId,
    /// What is wrong with it.
    pub kind: BadTarget,
}

/// A marked object references an unmarked one.
///
/// Either the heap was mutated between mark and sweep or the mark phase
/// missed an edge. The sweep that reports this commits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("live object {source_object} field {slot} references unmarked object {target}")]
pub struct DanglingReferenceError {
    /// The marked object.
    pub source_object: ObjectId,
    /// Field index within it.
    pub slot: usize,
    /// The unmarked target.
    pub target: ObjectId,
}

/// Any failure of a full collection cycle.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CollectorError {
    #[error(transparent)]
    InvalidReference(#[from] InvalidReferenceError),

    #[error(transparent)]
    InvalidRoot(#[from] InvalidRootError),

    #[error(transparent)]
    DanglingReference(#[from] DanglingReferenceError),
}
