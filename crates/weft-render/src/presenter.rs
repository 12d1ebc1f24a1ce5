#![forbid(unsafe_code)]

//! Presenter: state-tracked lowering of a diff into output operations.
//!
//! - **State tracking**: the cursor position and active attribute are
//!   remembered across operations (and frames), so `MoveCursor` is only
//!   emitted when the cursor is elsewhere and `SetAttr` only on change.
//! - **Run grouping**: consecutive cells of a region sharing one attribute
//!   become a single `WriteRun`.
//! - **Scrolls first**: each scroll is bracketed by `SetScrollRegion` /
//!   `ResetScrollRegion`. The attribute is reset to default beforehand so
//!   the exposed rows come up blank, and the cursor position is forgotten
//!   afterwards because DECSTBM homes the cursor.
//!
//! # Usage
//!
//! ```
//! use weft_render::buffer::Buffer;
//! use weft_render::cell::Cell;
//! use weft_render::diff::FrameDiff;
//! use weft_render::grapheme_pool::GraphemePool;
//! use weft_render::presenter::Presenter;
//! use weft_render::sink::{Op, RecordingSink};
//!
//! let old = Buffer::new(10, 2);
//! let mut new = Buffer::new(10, 2);
//! new.set(3, 1, Cell::from_char('x'));
//!
//! let mut presenter = Presenter::new();
//! let mut sink = RecordingSink::new();
//! let diff = FrameDiff::compute(&old, &new);
//! presenter.present(&diff, &new, &GraphemePool::new(), &mut sink).unwrap();
//! assert_eq!(sink.ops()[0], Op::MoveCursor { x: 3, y: 1 });
//! ```

use std::io;

use crate::buffer::Buffer;
use crate::cell::{Cell, PackedAttr};
use crate::diff::{FrameDiff, Region};
use crate::grapheme_pool::GraphemePool;
use crate::scroll::{ScrollOp, Shift};
use crate::sink::{Op, OutputSink};

/// Counters for one presented frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentStats {
    pub scrolls: usize,
    pub regions: usize,
    pub cursor_moves: usize,
    pub attr_changes: usize,
    pub runs: usize,
    pub cells: usize,
}

/// State-tracked diff presenter.
#[derive(Debug, Clone, Default)]
pub struct Presenter {
    /// `None` = unknown.
    cursor: Option<(u16, u16)>,
    /// `None` = unknown.
    attr: Option<PackedAttr>,
    run: String,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all terminal state (after a resize or external output).
    pub fn reset(&mut self) {
        self.cursor = None;
        self.attr = None;
        self.run.clear();
    }

    /// Last known cursor position.
    #[inline]
    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    /// Lower `diff` into operations on `sink`, reading cell contents from
    /// `frame` (the pending grid the diff was computed against).
    pub fn present<S: OutputSink + ?Sized>(
        &mut self,
        diff: &FrameDiff,
        frame: &Buffer,
        pool: &GraphemePool,
        sink: &mut S,
    ) -> io::Result<PresentStats> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "present",
            width = frame.width(),
            height = frame.height(),
            scrolls = diff.scrolls().len(),
            regions = diff.regions().len()
        );
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        debug_assert!(
            diff.scrolls().is_empty() || sink.supports_scroll(),
            "scroll ops sent to a sink without scroll support"
        );

        let mut stats = PresentStats::default();
        for op in diff.scrolls() {
            self.emit_scroll(op, sink, &mut stats)?;
        }
        for region in diff.regions() {
            self.emit_region(region, frame, pool, sink, &mut stats)?;
        }
        sink.end_frame()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(?stats, "frame presented");
        Ok(stats)
    }

    fn set_attr<S: OutputSink + ?Sized>(
        &mut self,
        attr: PackedAttr,
        sink: &mut S,
        stats: &mut PresentStats,
    ) -> io::Result<()> {
        if self.attr == Some(attr) {
            return Ok(());
        }
        sink.emit(Op::SetAttr(attr.decode()))?;
        self.attr = Some(attr);
        stats.attr_changes += 1;
        Ok(())
    }

    fn move_cursor<S: OutputSink + ?Sized>(
        &mut self,
        x: u16,
        y: u16,
        sink: &mut S,
        stats: &mut PresentStats,
    ) -> io::Result<()> {
        if self.cursor == Some((x, y)) {
            return Ok(());
        }
        sink.emit(Op::MoveCursor { x, y })?;
        self.cursor = Some((x, y));
        stats.cursor_moves += 1;
        Ok(())
    }

    fn emit_scroll<S: OutputSink + ?Sized>(
        &mut self,
        op: &ScrollOp,
        sink: &mut S,
        stats: &mut PresentStats,
    ) -> io::Result<()> {
        self.set_attr(PackedAttr::DEFAULT, sink, stats)?;
        sink.emit(Op::SetScrollRegion {
            top: op.span.top,
            bottom: op.span.bottom,
        })?;
        match op.shift {
            Shift::Up(n) => sink.emit(Op::ScrollUp(n))?,
            Shift::Down(n) => sink.emit(Op::ScrollDown(n))?,
        }
        sink.emit(Op::ResetScrollRegion)?;
        self.cursor = None;
        stats.scrolls += 1;
        Ok(())
    }

    fn flush_run<S: OutputSink + ?Sized>(
        &mut self,
        sink: &mut S,
        stats: &mut PresentStats,
    ) -> io::Result<()> {
        if self.run.is_empty() {
            return Ok(());
        }
        sink.emit(Op::WriteRun(self.run.as_str().into()))?;
        self.run.clear();
        stats.runs += 1;
        Ok(())
    }

    fn emit_region<S: OutputSink + ?Sized>(
        &mut self,
        region: &Region,
        frame: &Buffer,
        pool: &GraphemePool,
        sink: &mut S,
        stats: &mut PresentStats,
    ) -> io::Result<()> {
        let row = frame.row_cells(region.y);
        let end = (region.x1 as usize).min(row.len().saturating_sub(1));
        self.move_cursor(region.x0, region.y, sink, stats)?;

        let mut x = region.x0;
        for cell in &row[region.x0 as usize..=end] {
            if cell.is_continuation() {
                continue;
            }
            if self.attr != Some(cell.attr) {
                self.flush_run(sink, stats)?;
                self.set_attr(cell.attr, sink, stats)?;
            }
            push_cell_text(&mut self.run, cell, pool);
            x = x.saturating_add(cell.width() as u16);
            stats.cells += 1;
        }
        self.flush_run(sink, stats)?;

        // At the right margin the terminal's next write position is
        // ambiguous (pending wrap), so stop trusting the cursor there.
        self.cursor = (x < frame.width()).then_some((x, region.y));
        stats.regions += 1;
        Ok(())
    }
}

fn push_cell_text(out: &mut String, cell: &Cell, pool: &GraphemePool) {
    if let Some(id) = cell.content.grapheme_id() {
        out.push_str(pool.get(id).unwrap_or("\u{FFFD}"));
    } else if let Some(c) = cell.content.as_char() {
        out.push(c);
    } else {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attr, Color};
    use crate::scroll::{RowSpan, ScrollConfig};
    use crate::sink::RecordingSink;

    fn present(old: &Buffer, new: &Buffer, pool: &GraphemePool) -> (Vec<Op<'static>>, PresentStats) {
        let mut presenter = Presenter::new();
        let mut sink = RecordingSink::new();
        let diff = FrameDiff::compute(old, new);
        let stats = presenter
            .present(&diff, new, pool, &mut sink)
            .expect("recording sink never fails");
        (sink.ops().to_vec(), stats)
    }

    #[test]
    fn same_attr_cells_form_one_run() {
        let old = Buffer::new(10, 1);
        let mut new = Buffer::new(10, 1);
        let mut pool = GraphemePool::new();
        new.put_str(2, 0, "abc", PackedAttr::DEFAULT, &mut pool);
        let (ops, stats) = present(&old, &new, &pool);
        assert_eq!(
            ops,
            vec![
                Op::MoveCursor { x: 2, y: 0 },
                Op::SetAttr(Attr::DEFAULT),
                Op::WriteRun("abc".into()),
            ]
        );
        assert_eq!(stats.runs, 1);
    }

    #[test]
    fn attr_change_splits_run() {
        let old = Buffer::new(10, 1);
        let mut new = Buffer::new(10, 1);
        let mut pool = GraphemePool::new();
        let red = Attr::DEFAULT.fg(Color::Indexed(1));
        new.put_str(0, 0, "ab", PackedAttr::DEFAULT, &mut pool);
        new.put_str(2, 0, "cd", red.pack(), &mut pool);
        let (ops, stats) = present(&old, &new, &pool);
        assert_eq!(
            ops,
            vec![
                Op::MoveCursor { x: 0, y: 0 },
                Op::SetAttr(Attr::DEFAULT),
                Op::WriteRun("ab".into()),
                Op::SetAttr(red),
                Op::WriteRun("cd".into()),
            ]
        );
        assert_eq!(stats.attr_changes, 2);
    }

    #[test]
    fn wide_cells_skip_continuations() {
        let old = Buffer::new(6, 1);
        let mut new = Buffer::new(6, 1);
        let mut pool = GraphemePool::new();
        new.put_str(0, 0, "日x", PackedAttr::DEFAULT, &mut pool);
        let (ops, stats) = present(&old, &new, &pool);
        assert_eq!(ops.last(), Some(&Op::WriteRun("日x".into())));
        assert_eq!(stats.cells, 2);
    }

    #[test]
    fn cursor_is_reused_across_regions() {
        let old = Buffer::new(4, 2);
        let mut new = Buffer::new(4, 2);
        new.set(0, 0, Cell::from_char('a'));
        new.set(1, 1, Cell::from_char('b'));
        let mut presenter = Presenter::new();
        let mut sink = RecordingSink::new();
        let diff = FrameDiff::compute(&old, &new);
        presenter
            .present(&diff, &new, &GraphemePool::new(), &mut sink)
            .expect("recording sink never fails");
        assert_eq!(presenter.cursor(), Some((2, 1)));
        let moves = sink
            .ops()
            .iter()
            .filter(|op| matches!(op, Op::MoveCursor { .. }))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn right_margin_forgets_cursor() {
        let old = Buffer::new(2, 1);
        let mut new = Buffer::new(2, 1);
        new.set(1, 0, Cell::from_char('z'));
        let mut presenter = Presenter::new();
        let mut sink = RecordingSink::new();
        let diff = FrameDiff::compute(&old, &new);
        presenter
            .present(&diff, &new, &GraphemePool::new(), &mut sink)
            .expect("recording sink never fails");
        assert_eq!(presenter.cursor(), None);
    }

    #[test]
    fn scroll_is_bracketed_and_resets_attr() {
        let mut old = Buffer::new(1, 4);
        let mut new = Buffer::new(1, 4);
        let red = Attr::DEFAULT.fg(Color::Indexed(1)).pack();
        for (y, c) in "abcd".chars().enumerate() {
            old.set(0, y as u16, Cell::from_char(c).with_attr(red));
        }
        for (y, c) in "cd".chars().enumerate() {
            new.set(0, y as u16, Cell::from_char(c).with_attr(red));
        }
        let diff = FrameDiff::compute_with_scroll(
            &old,
            &new,
            &[RowSpan::new(0, 3)],
            &ScrollConfig::default(),
        );
        let mut presenter = Presenter::new();
        let mut sink = RecordingSink::new();
        let stats = presenter
            .present(&diff, &new, &GraphemePool::new(), &mut sink)
            .expect("recording sink never fails");
        assert_eq!(
            sink.ops(),
            &[
                Op::SetAttr(Attr::DEFAULT),
                Op::SetScrollRegion { top: 0, bottom: 3 },
                Op::ScrollUp(2),
                Op::ResetScrollRegion,
            ]
        );
        assert_eq!(stats.scrolls, 1);
        assert_eq!(presenter.cursor(), None);
    }
}
