// src/value/tagged.rs

//! Discriminant plus payload, 16 bytes.

use crate::object::ObjRef;
use crate::value::ValueKind;

#[derive(Clone, Copy)]
enum Repr {
    Bool(bool),
    Nil,
    Number(f64),
    Obj(ObjRef),
}

#[derive(Clone, Copy)]
pub struct Value(Repr);

impl Value {
    pub const NIL: Value = Value(Repr::Nil);
    pub const TRUE: Value = Value(Repr::Bool(true));
    pub const FALSE: Value = Value(Repr::Bool(false));

    pub const fn boolean(b: bool) -> Value {
        Value(Repr::Bool(b))
    }

    pub const fn number(n: f64) -> Value {
        Value(Repr::Number(n))
    }

    pub const fn object(handle: ObjRef) -> Value {
        Value(Repr::Obj(handle))
    }

    pub fn is_bool(self) -> bool {
        matches!(self.0, Repr::Bool(_))
    }

    pub fn is_nil(self) -> bool {
        matches!(self.0, Repr::Nil)
    }

    pub fn is_number(self) -> bool {
        matches!(self.0, Repr::Number(_))
    }

    pub fn is_obj(self) -> bool {
        matches!(self.0, Repr::Obj(_))
    }

    /// Only meaningful when `is_bool()` holds.
    pub fn as_bool(self) -> bool {
        match self.0 {
            Repr::Bool(b) => b,
            _ => panic!("cannot read {:?} as a bool", self),
        }
    }

    /// Only meaningful when `is_number()` holds.
    pub fn as_number(self) -> f64 {
        match self.0 {
            Repr::Number(n) => n,
            _ => panic!("cannot read {:?} as a number", self),
        }
    }

    /// Only meaningful when `is_obj()` holds.
    pub fn as_obj(self) -> ObjRef {
        match self.0 {
            Repr::Obj(handle) => handle,
            _ => panic!("cannot read {:?} as an object", self),
        }
    }

    pub fn kind(self) -> ValueKind {
        match self.0 {
            Repr::Bool(b) => ValueKind::Bool(b),
            Repr::Nil => ValueKind::Nil,
            Repr::Number(n) => ValueKind::Number(n),
            Repr::Obj(handle) => ValueKind::Obj(handle),
        }
    }
}

value_common!(Value);
