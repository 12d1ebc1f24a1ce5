#![forbid(unsafe_code)]

//! The displayed/pending frame pair.
//!
//! Exactly two grids exist per screen. Composition writes into `pending`;
//! after the diff is taken the two are swapped by pointer, so the previous
//! displayed grid becomes next pass's scratch space and is overwritten
//! rather than copied.

use crate::buffer::Buffer;

#[derive(Debug, Clone)]
pub struct FramePair {
    displayed: Buffer,
    pending: Buffer,
}

impl FramePair {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            displayed: Buffer::new(width, height),
            pending: Buffer::new(width, height),
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.displayed.width()
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.displayed.height()
    }

    /// What the terminal currently shows.
    #[inline]
    pub fn displayed(&self) -> &Buffer {
        &self.displayed
    }

    #[inline]
    pub fn pending(&self) -> &Buffer {
        &self.pending
    }

    /// Clear the pending grid and hand it out for composition.
    pub fn begin(&mut self) -> &mut Buffer {
        self.pending.clear();
        &mut self.pending
    }

    /// Both grids, for diffing.
    #[inline]
    pub fn both(&self) -> (&Buffer, &Buffer) {
        (&self.displayed, &self.pending)
    }

    /// Promote pending to displayed. O(1).
    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.displayed, &mut self.pending);
    }

    /// Reallocate both grids. The displayed grid becomes blank, matching a
    /// terminal that has just been cleared.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.displayed.resize(width, height);
        self.pending.resize(width, height);
    }
}
