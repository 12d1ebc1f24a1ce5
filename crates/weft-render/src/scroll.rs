#![forbid(unsafe_code)]

//! Scroll detection.
//!
//! After a line is inserted into or deleted from a scrollable region, most
//! of the region's rows reappear in the next frame shifted by a few rows.
//! Rewriting each of them is wasteful when the terminal can move them with a
//! single scroll-region operation.
//!
//! # Algorithm
//!
//! For a candidate span `top..=bottom` and each shift `N = 1..=K`:
//!
//! 1. Measure the run of rows, starting at the first row that would receive
//!    shifted content, for which `pending[r] == displayed[r ± N]`. A shift
//!    with an empty run is not a candidate.
//! 2. Score the shift by how many row rewrites it saves: rows of the span
//!    that differ from `displayed` directly, minus rows that would still
//!    differ from `displayed` after the scroll is simulated (exposed rows
//!    come back blank).
//!
//! The best score wins if it saves at least `min_rows_saved` rows. Ties go
//! to the smallest `N`, then to an upward shift.
//!
//! Claiming a shift never skips a row: the diff that follows compares
//! `pending` against the *scrolled* copy of `displayed`, so any row the
//! scroll did not reproduce exactly is still rewritten.

use crate::buffer::Buffer;
use crate::cell::Cell;

/// An inclusive range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowSpan {
    pub top: u16,
    pub bottom: u16,
}

impl RowSpan {
    #[inline]
    pub const fn new(top: u16, bottom: u16) -> Self {
        Self { top, bottom }
    }

    /// Number of rows in the span. Zero if `bottom < top`.
    #[inline]
    pub const fn rows(&self) -> u16 {
        if self.bottom < self.top {
            0
        } else {
            self.bottom - self.top + 1
        }
    }

    #[inline]
    pub const fn contains(&self, row: u16) -> bool {
        row >= self.top && row <= self.bottom
    }

    #[inline]
    pub const fn overlaps(&self, other: &RowSpan) -> bool {
        self.top <= other.bottom && other.top <= self.bottom
    }
}

/// Direction and distance of a vertical shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    /// Content moves toward the top; new rows appear at the bottom.
    Up(u16),
    /// Content moves toward the bottom; new rows appear at the top.
    Down(u16),
}

impl Shift {
    #[inline]
    pub const fn rows(self) -> u16 {
        match self {
            Shift::Up(n) | Shift::Down(n) => n,
        }
    }

    /// Signed row delta, positive for upward motion.
    #[inline]
    pub const fn signed(self) -> i32 {
        match self {
            Shift::Up(n) => n as i32,
            Shift::Down(n) => -(n as i32),
        }
    }
}

/// A claimed scroll of `span` by `shift`.
///
/// `run` rows, starting at [`ScrollOp::run_start`], are proven identical to
/// their pre-scroll source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrollOp {
    pub span: RowSpan,
    pub shift: Shift,
    pub run: u16,
}

impl ScrollOp {
    /// First row of the proven run (in pending coordinates).
    #[inline]
    pub const fn run_start(&self) -> u16 {
        match self.shift {
            Shift::Up(_) => self.span.top,
            Shift::Down(n) => self.span.top + n,
        }
    }

    /// Source row in the displayed grid for a pending row of the run.
    #[inline]
    pub const fn source_row(&self, row: u16) -> u16 {
        match self.shift {
            Shift::Up(n) => row + n,
            Shift::Down(n) => row - n,
        }
    }

    /// Rows revealed by the scroll, which the terminal fills with blanks.
    pub const fn exposed(&self) -> RowSpan {
        let n = self.shift.rows();
        match self.shift {
            Shift::Up(_) => RowSpan::new(self.span.bottom + 1 - n, self.span.bottom),
            Shift::Down(_) => RowSpan::new(self.span.top, self.span.top + n - 1),
        }
    }
}

/// Scroll detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Master switch.
    pub enabled: bool,
    /// Largest shift tested. `None` tests up to the span height minus one.
    pub max_shift: Option<u16>,
    /// Minimum net row rewrites a scroll must save to be claimed.
    pub min_rows_saved: u16,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_shift: None,
            min_rows_saved: 2,
        }
    }
}

impl ScrollConfig {
    /// Detection switched off.
    pub const DISABLED: Self = Self {
        enabled: false,
        max_shift: None,
        min_rows_saved: 2,
    };
}

/// Per-row fingerprints so most row comparisons are one integer compare.
struct RowHashes {
    displayed: Vec<u64>,
    pending: Vec<u64>,
    blank: u64,
}

fn hash_row(cells: &[Cell]) -> u64 {
    // FNV-1a over the packed words.
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for cell in cells {
        for word in [u64::from(cell.content.raw()), cell.attr.raw()] {
            h ^= word;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    h
}

struct Detector<'a> {
    displayed: &'a Buffer,
    pending: &'a Buffer,
    span: RowSpan,
    hashes: RowHashes,
}

impl<'a> Detector<'a> {
    fn new(displayed: &'a Buffer, pending: &'a Buffer, span: RowSpan) -> Self {
        let rows = span.top..=span.bottom;
        let blank = vec![Cell::BLANK; displayed.width() as usize];
        let hashes = RowHashes {
            displayed: rows.clone().map(|y| hash_row(displayed.row_cells(y))).collect(),
            pending: rows.map(|y| hash_row(pending.row_cells(y))).collect(),
            blank: hash_row(&blank),
        };
        Self {
            displayed,
            pending,
            span,
            hashes,
        }
    }

    #[inline]
    fn slot(&self, row: u16) -> usize {
        (row - self.span.top) as usize
    }

    /// `pending[p] == displayed[d]`
    fn same(&self, p: u16, d: u16) -> bool {
        self.hashes.pending[self.slot(p)] == self.hashes.displayed[self.slot(d)]
            && self.pending.row_cells(p) == self.displayed.row_cells(d)
    }

    fn pending_blank(&self, p: u16) -> bool {
        self.hashes.pending[self.slot(p)] == self.hashes.blank
            && self.pending.row_cells(p).iter().all(|c| *c == Cell::BLANK)
    }

    fn run_length(&self, shift: Shift) -> u16 {
        let op = ScrollOp {
            span: self.span,
            shift,
            run: 0,
        };
        let mut run = 0;
        let mut row = op.run_start();
        while row <= self.span.bottom {
            let src = op.source_row(row);
            if !self.span.contains(src) || !self.same(row, src) {
                break;
            }
            run += 1;
            row += 1;
        }
        run
    }

    /// Rows still needing a rewrite if `shift` is applied (or not, for `None`).
    fn cost(&self, shift: Option<Shift>) -> u32 {
        let mut cost = 0;
        for row in self.span.top..=self.span.bottom {
            let matches = match shift {
                None => self.same(row, row),
                Some(shift) => {
                    let src = i32::from(row) + shift.signed();
                    if src < i32::from(self.span.top) || src > i32::from(self.span.bottom) {
                        self.pending_blank(row)
                    } else {
                        self.same(row, src as u16)
                    }
                }
            };
            if !matches {
                cost += 1;
            }
        }
        cost
    }
}

/// Find the best uniform shift of `span` between `displayed` and `pending`.
///
/// Returns `None` when detection is disabled, the span is out of range or
/// shorter than two rows, or no shift saves enough rewrites.
pub fn detect(
    displayed: &Buffer,
    pending: &Buffer,
    span: RowSpan,
    config: &ScrollConfig,
) -> Option<ScrollOp> {
    if !config.enabled
        || displayed.width() != pending.width()
        || displayed.height() != pending.height()
        || span.rows() < 2
        || span.bottom >= displayed.height()
    {
        return None;
    }

    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("scroll_detect", top = span.top, bottom = span.bottom);
    #[cfg(feature = "tracing")]
    let _guard = _span.enter();

    let detector = Detector::new(displayed, pending, span);
    let baseline = detector.cost(None);
    if baseline == 0 {
        return None;
    }

    let limit = config
        .max_shift
        .unwrap_or(u16::MAX)
        .min(span.rows() - 1);

    let mut best: Option<(u32, ScrollOp)> = None;
    for n in 1..=limit {
        for shift in [Shift::Up(n), Shift::Down(n)] {
            let run = detector.run_length(shift);
            if run == 0 {
                continue;
            }
            let saved = baseline.saturating_sub(detector.cost(Some(shift)));
            // Strictly greater: earlier candidates (smaller N, Up first) win ties.
            if best.is_none_or(|(score, _)| saved > score) {
                best = Some((saved, ScrollOp { span, shift, run }));
            }
        }
    }

    let (saved, op) = best?;
    #[cfg(feature = "tracing")]
    tracing::trace!(?op, saved, "scroll candidate");
    (saved >= u32::from(config.min_rows_saved)).then_some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    /// One column per row, each row tagged with a char.
    fn column(rows: &str) -> Buffer {
        let mut buf = Buffer::new(2, rows.chars().count() as u16);
        for (y, c) in rows.chars().enumerate() {
            buf.set(0, y as u16, Cell::from_char(c));
            buf.set(1, y as u16, Cell::from_char(c));
        }
        buf
    }

    #[test]
    fn detects_upward_shift() {
        let old = column("abcdefgh");
        let new = column("defghxyz");
        let op = detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::default());
        assert_eq!(
            op,
            Some(ScrollOp {
                span: RowSpan::new(0, 7),
                shift: Shift::Up(3),
                run: 5,
            })
        );
    }

    #[test]
    fn detects_downward_shift() {
        let old = column("abcdefgh");
        let new = column("xyabcdef");
        let op = detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::default());
        assert_eq!(op.map(|o| o.shift), Some(Shift::Down(2)));
        assert_eq!(op.map(|o| o.run), Some(6));
    }

    #[test]
    fn identical_frames_need_no_scroll() {
        let old = column("abcdefgh");
        assert_eq!(detect(&old, &old, RowSpan::new(0, 7), &ScrollConfig::default()), None);
    }

    #[test]
    fn unrelated_frames_are_not_scrolled() {
        let old = column("abcdefgh");
        let new = column("stuvwxyz");
        assert_eq!(detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::default()), None);
    }

    #[test]
    fn disabled_config_never_detects() {
        let old = column("abcdefgh");
        let new = column("defghxyz");
        assert_eq!(detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::DISABLED), None);
    }

    #[test]
    fn max_shift_bounds_search() {
        let old = column("abcdefgh");
        let new = column("defghxyz");
        let config = ScrollConfig {
            max_shift: Some(2),
            ..ScrollConfig::default()
        };
        assert_eq!(detect(&old, &new, RowSpan::new(0, 7), &config), None);
    }

    #[test]
    fn tie_prefers_upward_shift() {
        // Up(1) and Down(1) each save two rewrites.
        let old = column("pqp");
        let new = column("qpq");
        let op = detect(&old, &new, RowSpan::new(0, 2), &ScrollConfig::default());
        assert_eq!(op.map(|o| o.shift), Some(Shift::Up(1)));
    }

    #[test]
    fn shift_with_best_savings_wins() {
        // Up(2) and Up(4) both have runs; Up(4) exposes rows that still
        // need rewriting.
        let old = column("abababab");
        let new = column("ababab  ");
        let op = detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::default());
        assert_eq!(op.map(|o| o.shift), Some(Shift::Up(2)));

        let old = column("xabababa");
        let new = column("abababa ");
        let op = detect(&old, &new, RowSpan::new(0, 7), &ScrollConfig::default());
        assert_eq!(op.map(|o| o.shift), Some(Shift::Up(1)));
    }

    #[test]
    fn exposed_rows() {
        let op = ScrollOp {
            span: RowSpan::new(2, 9),
            shift: Shift::Up(3),
            run: 5,
        };
        assert_eq!(op.exposed(), RowSpan::new(7, 9));
        let down = ScrollOp {
            shift: Shift::Down(2),
            ..op
        };
        assert_eq!(down.exposed(), RowSpan::new(2, 3));
        assert_eq!(down.run_start(), 4);
    }
}
