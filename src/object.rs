// src/object.rs

use std::fmt;
use std::mem;

/// Handle to an object in the heap's arena. Copying a handle never copies
/// or owns the object; the heap registry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    pub(crate) const fn new(index: u32) -> Self {
        ObjRef(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw handle bits, always within the low 48 bits of a word.
    pub(crate) fn to_bits(self) -> u64 {
        u64::from(self.0)
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        ObjRef(bits as u32)
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjType {
    String,
}

#[derive(Debug)]
pub enum ObjKind {
    String(ObjString),
}

/// A heap object plus its link to the next object in the registry.
#[derive(Debug)]
pub struct Obj {
    pub kind: ObjKind,
    pub(crate) next: Option<ObjRef>,
}

impl Obj {
    pub fn obj_type(&self) -> ObjType {
        match self.kind {
            ObjKind::String(_) => ObjType::String,
        }
    }

    /// The object allocated just before this one, if any.
    pub fn next(&self) -> Option<ObjRef> {
        self.next
    }

    pub fn as_string(&self) -> Option<&ObjString> {
        match &self.kind {
            ObjKind::String(s) => Some(s),
        }
    }

    /// Bytes this object accounts for, header and payload.
    pub(crate) fn byte_size(&self) -> usize {
        let payload = match &self.kind {
            ObjKind::String(s) => s.len(),
        };
        mem::size_of::<Obj>() + payload
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ObjKind::String(s) => f.write_str(s.as_str()),
        }
    }
}

/// An immutable, interned string.
#[derive(Debug)]
pub struct ObjString {
    chars: Box<str>,
    hash: u32,
}

impl ObjString {
    pub(crate) fn new(chars: String, hash: u32) -> Self {
        ObjString {
            chars: chars.into_boxed_str(),
            hash,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.chars.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

impl fmt::Display for ObjString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chars)
    }
}

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV-1a.
pub fn hash_string(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
