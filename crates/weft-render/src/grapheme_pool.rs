#![forbid(unsafe_code)]

//! Grapheme interning.
//!
//! Multi-codepoint clusters (ZWJ emoji, combining sequences) don't fit in a
//! 4-byte [`CellContent`](crate::cell::CellContent), so they are interned here
//! and cells hold a compact [`GraphemeId`]. Interning the same cluster twice
//! returns the same id, which keeps cell equality a plain integer compare.
//!
//! Entries are reclaimed by [`GraphemePool::gc`], a mark pass over the grids
//! that may still be read. Ids of surviving entries never change.
//!
//! ```
//! use weft_render::grapheme_pool::GraphemePool;
//!
//! let mut pool = GraphemePool::new();
//! let id = pool.intern("👍🏽", 2);
//! assert_eq!(pool.intern("👍🏽", 2), id);
//! assert_eq!(pool.get(id), Some("👍🏽"));
//! ```

use std::collections::HashMap;

use crate::buffer::Buffer;
use crate::cell::GraphemeId;

#[derive(Debug, Clone)]
struct GraphemeSlot {
    text: String,
    marked: bool,
}

/// Deduplicating store for grapheme clusters.
#[derive(Debug, Clone, Default)]
pub struct GraphemePool {
    slots: Vec<Option<GraphemeSlot>>,
    lookup: HashMap<String, GraphemeId>,
    free_list: Vec<u32>,
    slot_limit: Option<u32>,
}

impl GraphemePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool holding at most `limit` distinct clusters (capped at 2^24).
    pub fn with_slot_limit(limit: u32) -> Self {
        Self {
            slot_limit: Some(limit.min(GraphemeId::MAX_SLOT + 1)),
            ..Self::default()
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intern a cluster, returning the existing id if it is already present.
    ///
    /// Returns `None` only when every slot is in use (2^24 unless limited).
    pub fn try_intern(&mut self, text: &str, width: u8) -> Option<GraphemeId> {
        if let Some(&id) = self.lookup.get(text) {
            return Some(id);
        }
        let slot_idx = self.alloc_slot()?;
        let id = GraphemeId::new(slot_idx, width.min(GraphemeId::MAX_WIDTH));
        let slot = GraphemeSlot {
            text: text.to_string(),
            marked: false,
        };
        if (slot_idx as usize) < self.slots.len() {
            self.slots[slot_idx as usize] = Some(slot);
        } else {
            debug_assert_eq!(slot_idx as usize, self.slots.len());
            self.slots.push(Some(slot));
        }
        self.lookup.insert(text.to_string(), id);
        Some(id)
    }

    /// Intern a cluster.
    ///
    /// # Panics
    ///
    /// Panics if the pool is full (16M distinct clusters).
    pub fn intern(&mut self, text: &str, width: u8) -> GraphemeId {
        match self.try_intern(text, width) {
            Some(id) => id,
            None => panic!("grapheme pool capacity exceeded"),
        }
    }

    /// The cluster behind `id`, or `None` if it was collected.
    pub fn get(&self, id: GraphemeId) -> Option<&str> {
        self.slots
            .get(id.slot())
            .and_then(|slot| slot.as_ref())
            .map(|slot| slot.text.as_str())
    }

    /// Free every entry not referenced by a cell of `live`.
    ///
    /// Returns the number of entries freed.
    pub fn gc<'a>(&mut self, live: impl IntoIterator<Item = &'a Buffer>) -> usize {
        for buffer in live {
            for cell in buffer.cells() {
                if let Some(id) = cell.content.grapheme_id()
                    && let Some(Some(slot)) = self.slots.get_mut(id.slot())
                {
                    slot.marked = true;
                }
            }
        }

        let mut freed = 0;
        for (idx, entry) in self.slots.iter_mut().enumerate() {
            let Some(slot) = entry else { continue };
            if slot.marked {
                slot.marked = false;
                continue;
            }
            self.lookup.remove(&slot.text);
            *entry = None;
            self.free_list.push(idx as u32);
            freed += 1;
        }
        freed
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.lookup.clear();
        self.free_list.clear();
    }

    fn alloc_slot(&mut self) -> Option<u32> {
        if let Some(idx) = self.free_list.pop() {
            return Some(idx);
        }
        let idx = u32::try_from(self.slots.len()).ok()?;
        let limit = self.slot_limit.unwrap_or(GraphemeId::MAX_SLOT + 1);
        (idx < limit).then_some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, CellContent};

    #[test]
    fn deduplication() {
        let mut pool = GraphemePool::new();
        let a = pool.intern("🎉", 2);
        let b = pool.intern("🎉", 2);
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
        assert_eq!(a.width(), 2);
    }

    #[test]
    fn gc_keeps_referenced_entries() {
        let mut pool = GraphemePool::new();
        let kept = pool.intern("e\u{301}", 1);
        let dropped = pool.intern("👨\u{200D}👩\u{200D}👧", 2);

        let mut buf = Buffer::new(4, 1);
        buf.set(0, 0, Cell::new(CellContent::from_grapheme(kept), Default::default()));

        assert_eq!(pool.gc([&buf]), 1);
        assert_eq!(pool.get(kept), Some("e\u{301}"));
        assert_eq!(pool.get(dropped), None);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn slot_limit_refuses_new_clusters() {
        let mut pool = GraphemePool::with_slot_limit(1);
        let first = pool.try_intern("e\u{301}", 1);
        assert!(first.is_some());
        assert_eq!(pool.try_intern("e\u{301}", 1), first);
        assert_eq!(pool.try_intern("a\u{301}", 1), None);
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut pool = GraphemePool::new();
        let first = pool.intern("a\u{301}", 1);
        pool.gc(std::iter::empty());
        let second = pool.intern("o\u{301}", 1);
        assert_eq!(first.slot(), second.slot());
        assert_eq!(pool.get(second), Some("o\u{301}"));
    }
}
