// src/table.rs

//! Open-addressed hash table keyed by interned strings.
//!
//! Keys are string handles. Each entry keeps the key's hash next to it, so
//! resizing never has to go back to the heap. Deleted entries become
//! tombstones: lookups probe past them, inserts may reuse them.

use std::mem;

use log::debug;

use crate::error::MemoryError;
use crate::memory::{free_array, grow_capacity, reallocate};
use crate::object::ObjRef;
use crate::value::Value;

/// Maximum share of slots that may be in use, tombstones included.
pub const TABLE_MAX_LOAD: f64 = 0.75;

#[derive(Debug, Clone, Copy)]
enum Entry {
    Empty,
    Tombstone,
    Occupied { key: ObjRef, hash: u32, value: Value },
}

#[derive(Debug, Default)]
pub struct Table {
    entries: Vec<Entry>,
    live: usize,
    tombstones: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots, used or not.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Inserts or overwrites. Returns `true` when `key` was not present.
    pub fn set(&mut self, key: ObjRef, hash: u32, value: Value) -> Result<bool, MemoryError> {
        let used = self.live + self.tombstones + 1;
        if used as f64 > self.entries.len() as f64 * TABLE_MAX_LOAD {
            self.adjust_capacity(grow_capacity(self.entries.len()))?;
        }

        let index = find_slot(&self.entries, key, hash);
        let slot = &mut self.entries[index];
        let is_new = match slot {
            Entry::Occupied { .. } => false,
            Entry::Tombstone => {
                self.tombstones -= 1;
                true
            }
            Entry::Empty => true,
        };
        if is_new {
            self.live += 1;
        }
        *slot = Entry::Occupied { key, hash, value };
        Ok(is_new)
    }

    pub fn get(&self, key: ObjRef, hash: u32) -> Option<Value> {
        if self.live == 0 {
            return None;
        }
        match self.entries[find_slot(&self.entries, key, hash)] {
            Entry::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Replaces the entry with a tombstone. Returns `true` if it existed.
    pub fn delete(&mut self, key: ObjRef, hash: u32) -> bool {
        if self.live == 0 {
            return false;
        }
        let index = find_slot(&self.entries, key, hash);
        match self.entries[index] {
            Entry::Occupied { .. } => {
                self.entries[index] = Entry::Tombstone;
                self.live -= 1;
                self.tombstones += 1;
                true
            }
            _ => false,
        }
    }

    /// Copies every live entry of `from` into this table.
    pub fn add_all(&mut self, from: &Table) -> Result<(), MemoryError> {
        for (key, hash, value) in from.iter() {
            self.set(key, hash, value)?;
        }
        Ok(())
    }

    /// Looks for an interned string by content. `contents` resolves a key to
    /// its bytes; only keys whose hash matches are ever resolved.
    pub fn find_string<'a, F>(&self, chars: &[u8], hash: u32, contents: F) -> Option<ObjRef>
    where
        F: Fn(ObjRef) -> Option<&'a [u8]>,
    {
        if self.live == 0 {
            return None;
        }

        let capacity = self.entries.len();
        let mut index = hash as usize % capacity;
        loop {
            match self.entries[index] {
                Entry::Empty => return None,
                Entry::Tombstone => {}
                Entry::Occupied { key, hash: h, .. } => {
                    if h == hash && contents(key) == Some(chars) {
                        return Some(key);
                    }
                }
            }
            index = (index + 1) % capacity;
        }
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjRef, u32, Value)> + '_ {
        self.entries.iter().filter_map(|entry| match *entry {
            Entry::Occupied { key, hash, value } => Some((key, hash, value)),
            _ => None,
        })
    }

    /// Drops every entry and releases the slot array.
    pub fn free(&mut self) {
        free_array(&mut self.entries);
        self.live = 0;
        self.tombstones = 0;
    }

    /// Rehashes into `capacity` fresh slots. Tombstones are dropped.
    fn adjust_capacity(&mut self, capacity: usize) -> Result<(), MemoryError> {
        let mut entries = Vec::new();
        reallocate(&mut entries, 0, capacity)?;
        entries.resize(capacity, Entry::Empty);

        let old = mem::replace(&mut self.entries, entries);
        for entry in &old {
            if let Entry::Occupied { key, hash, .. } = *entry {
                let index = find_slot(&self.entries, key, hash);
                self.entries[index] = *entry;
            }
        }

        debug!(
            "table resized from {} to {} slots ({} live, {} tombstones dropped)",
            old.len(),
            capacity,
            self.live,
            self.tombstones
        );
        self.tombstones = 0;
        Ok(())
    }
}

/// Linear probe from `hash % capacity`. Returns the slot holding `key`, or
/// else the first tombstone passed, or else the empty slot that ended the
/// probe. `entries` must be non-empty and contain at least one empty slot.
fn find_slot(entries: &[Entry], key: ObjRef, hash: u32) -> usize {
    let capacity = entries.len();
    let mut index = hash as usize % capacity;
    let mut tombstone = None;

    loop {
        match entries[index] {
            Entry::Empty => return tombstone.unwrap_or(index),
            Entry::Tombstone => {
                if tombstone.is_none() {
                    tombstone = Some(index);
                }
            }
            Entry::Occupied { key: k, .. } if k == key => return index,
            Entry::Occupied { .. } => {}
        }
        index = (index + 1) % capacity;
    }
}
