#![forbid(unsafe_code)]

//! Diff computation between frames.
//!
//! For each row, the pending grid is compared against the displayed grid and
//! at most one [`Region`] is emitted: the minimal column span covering every
//! changed cell of that row, widened only as far as needed to avoid splitting
//! a wide grapheme in either grid. Continuation cells are therefore never
//! dirty on their own; their head is always in the same region.
//!
//! With scroll detection, candidate row spans are first offered to
//! [`scroll::detect`](crate::scroll::detect). Each claimed shift is applied to
//! a scratch copy of the displayed grid and the row diff runs against that
//! copy, which is exactly what the terminal will show once the scroll has
//! been performed.
//!
//! # Usage
//!
//! ```
//! use weft_render::buffer::Buffer;
//! use weft_render::cell::Cell;
//! use weft_render::diff::{FrameDiff, Region};
//!
//! let old = Buffer::new(80, 24);
//! let mut new = Buffer::new(80, 24);
//! new.set(5, 5, Cell::from_char('X'));
//!
//! let diff = FrameDiff::compute(&old, &new);
//! assert_eq!(diff.regions(), &[Region::new(5, 5, 5)]);
//! ```

use smallvec::SmallVec;

use crate::buffer::Buffer;
use crate::cell::Cell;
use crate::scroll::{self, RowSpan, ScrollConfig, ScrollOp};

/// A changed column span on a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// Row index.
    pub y: u16,
    /// Start column (inclusive).
    pub x0: u16,
    /// End column (inclusive).
    pub x1: u16,
}

impl Region {
    #[inline]
    pub const fn new(y: u16, x0: u16, x1: u16) -> Self {
        debug_assert!(x0 <= x1);
        Self { y, x0, x1 }
    }

    /// Number of cells in this region.
    #[inline]
    pub const fn len(&self) -> u16 {
        self.x1 - self.x0 + 1
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x1 < self.x0
    }
}

/// One step of the output plan, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Scroll(ScrollOp),
    Region(Region),
}

/// The difference between two frames: scroll operations first, then regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameDiff {
    scrolls: SmallVec<[ScrollOp; 2]>,
    regions: Vec<Region>,
}

impl FrameDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain row diff without scroll detection.
    pub fn compute(old: &Buffer, new: &Buffer) -> Self {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::debug_span!("diff_compute", width = old.width(), height = old.height());
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        let mut diff = Self::new();
        diff.push_rows(old, new);

        #[cfg(feature = "tracing")]
        tracing::trace!(regions = diff.regions.len(), "diff computed");
        diff
    }

    /// Row diff preceded by scroll detection over `spans`.
    ///
    /// Spans are considered top to bottom; a span overlapping one already
    /// claimed is skipped. Out-of-range spans are ignored.
    pub fn compute_with_scroll(
        old: &Buffer,
        new: &Buffer,
        spans: &[RowSpan],
        config: &ScrollConfig,
    ) -> Self {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "diff_compute_scroll",
            width = old.width(),
            height = old.height(),
            spans = spans.len()
        );
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        if !config.enabled || spans.is_empty() {
            return Self::compute(old, new);
        }

        let mut ordered: SmallVec<[RowSpan; 4]> = spans.iter().copied().collect();
        ordered.sort_by_key(|s| (s.top, s.bottom));

        let mut diff = Self::new();
        let mut scrolled: Option<Buffer> = None;
        for span in ordered {
            if diff.scrolls.iter().any(|op| op.span.overlaps(&span)) {
                continue;
            }
            let base = scrolled.as_ref().unwrap_or(old);
            if let Some(op) = scroll::detect(base, new, span, config) {
                let target = scrolled.get_or_insert_with(|| old.clone());
                target.scroll_rows(op.span.top, op.span.bottom, op.shift.signed());
                diff.scrolls.push(op);
            }
        }

        diff.push_rows(scrolled.as_ref().unwrap_or(old), new);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            scrolls = diff.scrolls.len(),
            regions = diff.regions.len(),
            "diff computed"
        );
        diff
    }

    fn push_rows(&mut self, old: &Buffer, new: &Buffer) {
        debug_assert_eq!(old.width(), new.width(), "buffer widths must match");
        debug_assert_eq!(old.height(), new.height(), "buffer heights must match");
        let height = old.height().min(new.height());
        for y in 0..height {
            if let Some(region) = row_region(old.row_cells(y), new.row_cells(y), y) {
                self.regions.push(region);
            }
        }
    }

    #[inline]
    pub fn scrolls(&self) -> &[ScrollOp] {
        &self.scrolls
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// All operations in emission order.
    pub fn ops(&self) -> impl Iterator<Item = DiffOp> + '_ {
        self.scrolls
            .iter()
            .copied()
            .map(DiffOp::Scroll)
            .chain(self.regions.iter().copied().map(DiffOp::Region))
    }

    /// Total number of operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.scrolls.len() + self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scrolls.is_empty() && self.regions.is_empty()
    }

    /// Number of cells covered by regions.
    pub fn cell_count(&self) -> usize {
        self.regions.iter().map(|r| r.len() as usize).sum()
    }

    /// Replay the diff onto `target` (a copy of the old frame), taking region
    /// contents from `source` (the new frame).
    pub fn apply(&self, target: &mut Buffer, source: &Buffer) {
        for op in &self.scrolls {
            target.scroll_rows(op.span.top, op.span.bottom, op.shift.signed());
        }
        for r in &self.regions {
            target.copy_span(source, r.y, r.x0, r.x1);
        }
    }

    pub fn clear(&mut self) {
        self.scrolls.clear();
        self.regions.clear();
    }
}

/// The changed span of one row, widened so no wide pair is split.
fn row_region(old: &[Cell], new: &[Cell], y: u16) -> Option<Region> {
    let first = old.iter().zip(new).position(|(a, b)| !a.bits_eq(b))?;
    let last = old
        .iter()
        .zip(new)
        .rposition(|(a, b)| !a.bits_eq(b))
        .unwrap_or(first);

    let mut x0 = first;
    while x0 > 0 && (old[x0].is_continuation() || new[x0].is_continuation()) {
        x0 -= 1;
    }
    let mut x1 = last;
    while x1 + 1 < new.len() && (old[x1 + 1].is_continuation() || new[x1 + 1].is_continuation()) {
        x1 += 1;
    }
    Some(Region::new(y, x0 as u16, x1 as u16))
}
