// src/value/nanbox.rs

//! One 64-bit word per value.
//!
//! Any bit pattern that is not a quiet NaN is read as an `f64`. Inside the
//! quiet NaN space the low two bits tag `nil`, `false` and `true`, and a set
//! sign bit marks an object whose handle lives in the low 48 bits.

use crate::object::ObjRef;
use crate::value::ValueKind;

const SIGN_BIT: u64 = 0x8000_0000_0000_0000;
// Quiet NaN plus the Intel "floating point indefinite" bit.
const QNAN: u64 = 0x7ffc_0000_0000_0000;
const PAYLOAD_MASK: u64 = 0x0000_ffff_ffff_ffff;

const TAG_NIL: u64 = 1;
const TAG_FALSE: u64 = 2;
const TAG_TRUE: u64 = 3;

#[derive(Clone, Copy)]
pub struct Value(u64);

impl Value {
    pub const NIL: Value = Value(QNAN | TAG_NIL);
    pub const TRUE: Value = Value(QNAN | TAG_TRUE);
    pub const FALSE: Value = Value(QNAN | TAG_FALSE);

    pub const fn boolean(b: bool) -> Value {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    /// NaNs are stored as the canonical quiet NaN so a payload can never
    /// collide with the tag space.
    pub fn number(n: f64) -> Value {
        if n.is_nan() {
            Value(f64::NAN.to_bits())
        } else {
            Value(n.to_bits())
        }
    }

    pub fn object(handle: ObjRef) -> Value {
        Value(SIGN_BIT | QNAN | (handle.to_bits() & PAYLOAD_MASK))
    }

    pub fn is_bool(self) -> bool {
        (self.0 | 1) == Value::TRUE.0
    }

    pub fn is_nil(self) -> bool {
        self.0 == Value::NIL.0
    }

    pub fn is_number(self) -> bool {
        (self.0 & QNAN) != QNAN
    }

    pub fn is_obj(self) -> bool {
        (self.0 & (SIGN_BIT | QNAN)) == (SIGN_BIT | QNAN)
    }

    pub fn as_bool(self) -> bool {
        self.0 == Value::TRUE.0
    }

    pub fn as_number(self) -> f64 {
        f64::from_bits(self.0)
    }

    pub fn as_obj(self) -> ObjRef {
        ObjRef::from_bits(self.0 & PAYLOAD_MASK)
    }

    /// Raw word, for debugging the encoding.
    pub fn to_bits(self) -> u64 {
        self.0
    }

    pub fn kind(self) -> ValueKind {
        if self.is_number() {
            ValueKind::Number(self.as_number())
        } else if self.is_obj() {
            ValueKind::Obj(self.as_obj())
        } else if self.is_nil() {
            ValueKind::Nil
        } else {
            ValueKind::Bool(self.as_bool())
        }
    }
}

value_common!(Value);
