// src/memory.rs

use std::mem;

use log::debug;

use crate::error::MemoryError;
use crate::object::{hash_string, Obj, ObjKind, ObjRef, ObjString};
use crate::table::Table;
use crate::value::Value;

// --- Growth Policy ---

/// Capacity every growable array starts from.
pub const MIN_CAPACITY: usize = 8;

pub fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity.saturating_mul(2)
    }
}

/// The single reallocation primitive. What it does depends only on the
/// capacities it is given:
///
/// - `old_capacity == 0`: fresh allocation of `new_capacity` slots.
/// - `new_capacity == 0`: the buffer is released and owns no allocation.
/// - `new_capacity < old_capacity`: truncate, then shrink in place if the
///   allocator allows it.
/// - `new_capacity > old_capacity`: grow; existing elements are kept, the
///   storage may move.
///
/// A refused growth comes back as [`MemoryError::OutOfMemory`] instead of
/// aborting the process.
pub fn reallocate<T>(
    buffer: &mut Vec<T>,
    old_capacity: usize,
    new_capacity: usize,
) -> Result<(), MemoryError> {
    if new_capacity == 0 {
        free_array(buffer);
        return Ok(());
    }

    if new_capacity < old_capacity {
        buffer.truncate(new_capacity);
        buffer.shrink_to(new_capacity);
        return Ok(());
    }

    let additional = new_capacity.saturating_sub(buffer.len());
    buffer
        .try_reserve_exact(additional)
        .map_err(|_| MemoryError::OutOfMemory {
            requested: new_capacity.saturating_mul(mem::size_of::<T>()),
        })
}

/// Releases a buffer's storage.
pub fn free_array<T>(buffer: &mut Vec<T>) {
    *buffer = Vec::new();
}

/// Makes room for one more element, doubling when the buffer is full.
pub fn grow_array<T>(buffer: &mut Vec<T>) -> Result<(), MemoryError> {
    if buffer.len() < buffer.capacity() {
        return Ok(());
    }
    let capacity = buffer.capacity();
    reallocate(buffer, capacity, grow_capacity(capacity))
}

// --- The Object Heap ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub objects_allocated: usize,
    pub objects_freed: usize,
    pub bytes_allocated: usize,
}

impl HeapStats {
    pub fn live_objects(&self) -> usize {
        self.objects_allocated - self.objects_freed
    }
}

/// Owns every heap object.
///
/// Objects live in an arena addressed by [`ObjRef`]. Each one also links to
/// the object allocated before it, so `head` walks the whole registry in
/// reverse allocation order. Handle numbers are never reused: teardown
/// releases the slot storage and moves `base` past every number handed out
/// so far, so a stale handle cannot alias a newer object. The string intern
/// table lives here too, since interning is part of allocating a string.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Option<Obj>>,
    // Handle number of `objects[0]`.
    base: u32,
    head: Option<ObjRef>,
    strings: Table,
    stats: HeapStats,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the object and prepends it to the registry.
    fn allocate(&mut self, kind: ObjKind) -> Result<ObjRef, MemoryError> {
        let index = u32::try_from(self.objects.len())
            .ok()
            .and_then(|len| self.base.checked_add(len))
            .filter(|&index| index < u32::MAX)
            .ok_or(MemoryError::OutOfMemory {
                requested: mem::size_of::<Obj>(),
            })?;
        grow_array(&mut self.objects)?;

        let handle = ObjRef::new(index);
        let obj = Obj {
            kind,
            next: self.head,
        };
        let size = obj.byte_size();
        let obj_type = obj.obj_type();

        self.objects.push(Some(obj));
        self.head = Some(handle);
        self.stats.objects_allocated += 1;
        self.stats.bytes_allocated += size;

        debug!("{} allocate {} for {:?}", handle, size, obj_type);
        Ok(handle)
    }

    pub fn get(&self, handle: ObjRef) -> Option<&Obj> {
        self.slot(handle)
            .and_then(|slot| self.objects.get(slot))
            .and_then(|obj| obj.as_ref())
    }

    /// Position of `handle` in the arena, if it was issued since the last
    /// teardown.
    fn slot(&self, handle: ObjRef) -> Option<usize> {
        handle.index().checked_sub(self.base as usize)
    }

    /// Arena slots currently held, live or not.
    pub fn slots(&self) -> usize {
        self.objects.len()
    }

    pub fn string(&self, handle: ObjRef) -> Option<&ObjString> {
        self.get(handle).and_then(Obj::as_string)
    }

    /// The string a value refers to, if it refers to one.
    pub fn as_string(&self, value: Value) -> Option<&ObjString> {
        if value.is_obj() {
            self.string(value.as_obj())
        } else {
            None
        }
    }

    /// Interns a copy of `chars`.
    pub fn copy_string(&mut self, chars: &str) -> Result<ObjRef, MemoryError> {
        let hash = hash_string(chars.as_bytes());
        if let Some(interned) = self.find_interned(chars, hash) {
            return Ok(interned);
        }
        self.allocate_string(chars.to_owned(), hash)
    }

    /// Interns `chars`, taking over its buffer. If an equal string already
    /// exists the buffer is dropped and the existing handle returned.
    pub fn take_string(&mut self, chars: String) -> Result<ObjRef, MemoryError> {
        let hash = hash_string(chars.as_bytes());
        if let Some(interned) = self.find_interned(&chars, hash) {
            return Ok(interned);
        }
        self.allocate_string(chars, hash)
    }

    /// The interned string equal to `chars`, without allocating.
    pub(crate) fn find_interned(&self, chars: &str, hash: u32) -> Option<ObjRef> {
        let objects = &self.objects;
        let base = self.base as usize;
        self.strings
            .find_string(chars.as_bytes(), hash, move |handle| {
                handle
                    .index()
                    .checked_sub(base)
                    .and_then(|slot| objects.get(slot))
                    .and_then(|slot| slot.as_ref())
                    .and_then(Obj::as_string)
                    .map(ObjString::as_bytes)
            })
    }

    fn allocate_string(&mut self, chars: String, hash: u32) -> Result<ObjRef, MemoryError> {
        let handle = self.allocate(ObjKind::String(ObjString::new(chars, hash)))?;
        self.strings.set(handle, hash, Value::NIL)?;
        Ok(handle)
    }

    /// Number of distinct strings in the intern table.
    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    /// Most recently allocated object.
    pub fn head(&self) -> Option<ObjRef> {
        self.head
    }

    /// Walks the registry from the newest object to the oldest.
    pub fn objects(&self) -> Objects<'_> {
        Objects {
            heap: self,
            cursor: self.head,
        }
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Releases every registered object, the arena slots and the intern
    /// table. Calling it again is a no-op.
    pub fn free_objects(&mut self) {
        let mut cursor = self.head.take();
        let mut freed = 0usize;

        while let Some(handle) = cursor {
            let obj = self
                .slot(handle)
                .and_then(|slot| self.objects.get_mut(slot))
                .and_then(Option::take);
            cursor = match obj {
                Some(obj) => {
                    debug!("{} free type {:?}", handle, obj.obj_type());
                    self.stats.objects_freed += 1;
                    self.stats.bytes_allocated =
                        self.stats.bytes_allocated.saturating_sub(obj.byte_size());
                    freed += 1;
                    obj.next
                }
                None => None,
            };
        }

        // `allocate` keeps base + len within u32.
        // Handles below the new base resolve to nothing from here on.
        self.base += self.objects.len() as u32;
        free_array(&mut self.objects);
        self.strings.free();
        if freed > 0 {
            debug!(
                "freed {} objects, {} still live",
                freed,
                self.stats.live_objects()
            );
        }
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.free_objects();
    }
}

/// Iterator over the object registry.
pub struct Objects<'a> {
    heap: &'a Heap,
    cursor: Option<ObjRef>,
}

impl<'a> Iterator for Objects<'a> {
    type Item = (ObjRef, &'a Obj);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let obj = self.heap.get(handle)?;
        self.cursor = obj.next;
        Some((handle, obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_capacity_policy() {
        assert_eq!(grow_capacity(0), 8);
        assert_eq!(grow_capacity(7), 8);
        assert_eq!(grow_capacity(8), 16);
        assert_eq!(grow_capacity(300), 600);
    }

    #[test]
    fn test_reallocate_four_ways() {
        // allocate
        let mut buf: Vec<u32> = Vec::new();
        reallocate(&mut buf, 0, 8).unwrap();
        assert!(buf.capacity() >= 8);

        // grow keeps contents
        buf.extend(0..8);
        reallocate(&mut buf, 8, 16).unwrap();
        assert!(buf.capacity() >= 16);
        assert_eq!(buf, (0..8).collect::<Vec<_>>());

        // shrink
        reallocate(&mut buf, 16, 4).unwrap();
        assert_eq!(buf, vec![0, 1, 2, 3]);

        // free
        reallocate(&mut buf, 4, 0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn test_refused_growth_is_an_error() {
        let mut buf: Vec<u64> = Vec::new();
        let err = reallocate(&mut buf, 0, usize::MAX).unwrap_err();
        assert!(matches!(err, MemoryError::OutOfMemory { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_grow_array_doubles() {
        let mut buf: Vec<u8> = Vec::new();
        grow_array(&mut buf).unwrap();
        assert!(buf.capacity() >= 8);
        let first = buf.capacity();
        buf.resize(first, 0);
        grow_array(&mut buf).unwrap();
        assert!(buf.capacity() >= first * 2);
    }

    #[test]
    fn test_registry_is_newest_first() {
        let mut heap = Heap::new();
        let a = heap.copy_string("a").unwrap();
        let b = heap.copy_string("b").unwrap();
        let c = heap.copy_string("c").unwrap();

        assert_eq!(heap.head(), Some(c));
        let order: Vec<ObjRef> = heap.objects().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn test_free_objects_is_idempotent() {
        let mut heap = Heap::new();
        heap.copy_string("one").unwrap();
        heap.copy_string("two").unwrap();
        assert_eq!(heap.stats().live_objects(), 2);
        assert!(heap.stats().bytes_allocated > 0);

        heap.free_objects();
        assert_eq!(heap.stats().objects_freed, 2);
        assert_eq!(heap.stats().bytes_allocated, 0);
        assert_eq!(heap.head(), None);
        assert_eq!(heap.interned_count(), 0);

        heap.free_objects();
        assert_eq!(heap.stats().objects_freed, 2);
    }

    #[test]
    fn test_stale_handle_resolves_to_nothing() {
        let mut heap = Heap::new();
        let s = heap.copy_string("gone").unwrap();
        heap.free_objects();
        assert!(heap.get(s).is_none());

        let fresh = heap.copy_string("gone").unwrap();
        assert_ne!(fresh, s);
        assert!(heap.get(s).is_none());
        assert_eq!(heap.string(fresh).map(ObjString::as_str), Some("gone"));
    }

    #[test]
    fn test_free_objects_releases_arena_slots() {
        let mut heap = Heap::new();
        let mut previous = Vec::new();
        for round in 0..3 {
            let handles: Vec<ObjRef> = (0..1_000)
                .map(|i| heap.copy_string(&format!("s{}", i)).unwrap())
                .collect();
            assert_eq!(heap.slots(), 1_000, "round {}", round);
            assert!(handles.iter().all(|h| !previous.contains(h)));

            heap.free_objects();
            assert_eq!(heap.slots(), 0);
            assert_eq!(heap.objects.capacity(), 0);
            assert_eq!(heap.stats().live_objects(), 0);
            assert!(handles.iter().all(|&h| heap.get(h).is_none()));
            previous = handles;
        }
    }
}
