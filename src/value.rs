// src/value.rs

//! Runtime values.
//!
//! Two encodings sit behind one interface: [`tagged::Value`], a plain sum
//! type, and [`nanbox::Value`], which packs everything into one 64-bit word.
//! The `nan_boxing` feature decides which one the rest of the crate calls
//! [`Value`]. Nothing outside this module may depend on the choice.

use std::fmt;

use crate::memory::Heap;
use crate::object::ObjRef;

/// Shared surface for both encodings. Everything here goes through
/// `kind()`, so the encodings only provide constructors and predicates.
macro_rules! value_common {
    ($ty:ty) => {
        impl $ty {
            pub fn from_kind(kind: $crate::value::ValueKind) -> Self {
                match kind {
                    $crate::value::ValueKind::Bool(b) => Self::boolean(b),
                    $crate::value::ValueKind::Nil => Self::NIL,
                    $crate::value::ValueKind::Number(n) => Self::number(n),
                    $crate::value::ValueKind::Obj(handle) => Self::object(handle),
                }
            }

            /// `nil` and `false` are falsey, everything else is truthy.
            pub fn is_falsey(self) -> bool {
                self.is_nil() || (self.is_bool() && !self.as_bool())
            }

            pub fn display(self, heap: &$crate::memory::Heap) -> $crate::value::ValueDisplay<'_> {
                $crate::value::ValueDisplay {
                    kind: self.kind(),
                    heap,
                }
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::value::kinds_equal(self.kind(), other.kind())
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?}", self.kind())
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::NIL
            }
        }

        impl From<bool> for $ty {
            fn from(b: bool) -> Self {
                Self::boolean(b)
            }
        }

        impl From<f64> for $ty {
            fn from(n: f64) -> Self {
                Self::number(n)
            }
        }

        impl From<$crate::object::ObjRef> for $ty {
            fn from(handle: $crate::object::ObjRef) -> Self {
                Self::object(handle)
            }
        }
    };
}

pub mod nanbox;
pub mod tagged;

#[cfg(feature = "nan_boxing")]
pub use nanbox::Value;
#[cfg(not(feature = "nan_boxing"))]
pub use tagged::Value;

/// A decoded value, independent of how it was stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    Bool(bool),
    Nil,
    Number(f64),
    Obj(ObjRef),
}

/// Objects compare by handle. That is enough for strings because equal
/// contents are always interned to one object.
pub fn kinds_equal(a: ValueKind, b: ValueKind) -> bool {
    match (a, b) {
        (ValueKind::Nil, ValueKind::Nil) => true,
        (ValueKind::Bool(a), ValueKind::Bool(b)) => a == b,
        (ValueKind::Number(a), ValueKind::Number(b)) => a == b,
        (ValueKind::Obj(a), ValueKind::Obj(b)) => a == b,
        _ => false,
    }
}

pub fn values_equal(a: Value, b: Value) -> bool {
    kinds_equal(a.kind(), b.kind())
}

/// Canonical rendering of a value; strings are resolved through the heap.
pub struct ValueDisplay<'a> {
    kind: ValueKind,
    heap: &'a Heap,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ValueKind::Bool(b) => write!(f, "{}", b),
            ValueKind::Nil => f.write_str("nil"),
            ValueKind::Number(n) => write!(f, "{}", n),
            ValueKind::Obj(handle) => match self.heap.get(handle) {
                Some(obj) => write!(f, "{}", obj),
                None => write!(f, "<freed {}>", handle),
            },
        }
    }
}
