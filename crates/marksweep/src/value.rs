//! Object identifiers and field values.

use std::fmt;

/// Index of an object in the heap's object table.
///
/// Ids are plain data, not owning handles: holding an `ObjectId` keeps
/// nothing alive and a reference cycle between objects is just a cycle
/// between integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Create an id for the object at `index`.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the object in the heap's object table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ObjectId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The contents of one object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// A leaf value. Never traced.
    Immediate(i64),
    /// A reference to another heap object.
    Reference(ObjectId),
}

impl Value {
    /// Shorthand for `Value::Reference(ObjectId::new(index))`.
    #[must_use]
    pub const fn reference(index: usize) -> Self {
        Self::Reference(ObjectId::new(index))
    }

    /// The referenced object, if this is a reference.
    #[must_use]
    pub const fn as_reference(&self) -> Option<ObjectId> {
        match *self {
            Self::Reference(target) => Some(target),
            Self::Immediate(_) => None,
        }
    }

    /// The immediate integer, if this is a leaf value.
    #[must_use]
    pub const fn as_immediate(&self) -> Option<i64> {
        match *self {
            Self::Immediate(value) => Some(value),
            Self::Reference(_) => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Immediate(0)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Immediate(value)
    }
}

impl From<ObjectId> for Value {
    fn from(target: ObjectId) -> Self {
        Self::Reference(target)
    }
}
