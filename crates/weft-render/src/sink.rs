#![forbid(unsafe_code)]

//! Output operations and the sinks that receive them.
//!
//! The render kernel never produces escape bytes itself. The
//! [`Presenter`](crate::presenter::Presenter) lowers a diff into a stream of
//! abstract [`Op`]s and hands them to an [`OutputSink`]. A
//! [`TerminalSink`] turns each op into bytes through a
//! [`TerminalCapabilities`] provider; [`RecordingSink`] keeps them for
//! inspection.

use std::borrow::Cow;
use std::io::{self, BufWriter, Write};

use crate::cell::Attr;

/// Size of the terminal sink's write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

/// One output operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op<'a> {
    /// Absolute cursor position (0-indexed).
    MoveCursor { x: u16, y: u16 },
    /// Make `Attr` the active attribute for subsequent text.
    SetAttr(Attr),
    /// Text at the cursor; the cursor advances by its display width.
    WriteRun(Cow<'a, str>),
    /// Restrict scrolling to rows `top..=bottom`.
    SetScrollRegion { top: u16, bottom: u16 },
    /// Scroll the active region up by `n` rows.
    ScrollUp(u16),
    /// Scroll the active region down by `n` rows.
    ScrollDown(u16),
    /// Restore the full-screen scroll region.
    ResetScrollRegion,
}

impl Op<'_> {
    /// Detach from any borrowed text.
    pub fn into_owned(self) -> Op<'static> {
        match self {
            Op::MoveCursor { x, y } => Op::MoveCursor { x, y },
            Op::SetAttr(attr) => Op::SetAttr(attr),
            Op::WriteRun(text) => Op::WriteRun(Cow::Owned(text.into_owned())),
            Op::SetScrollRegion { top, bottom } => Op::SetScrollRegion { top, bottom },
            Op::ScrollUp(n) => Op::ScrollUp(n),
            Op::ScrollDown(n) => Op::ScrollDown(n),
            Op::ResetScrollRegion => Op::ResetScrollRegion,
        }
    }
}

/// Append-only destination for output operations.
///
/// Batching and flushing are the sink's business; the presenter calls
/// [`end_frame`](OutputSink::end_frame) once per presented frame.
pub trait OutputSink {
    fn emit(&mut self, op: Op<'_>) -> io::Result<()>;

    fn end_frame(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Whether scroll-region operations may be emitted.
    fn supports_scroll(&self) -> bool {
        true
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, op: Op<'_>) -> io::Result<()> {
        (**self).emit(op)
    }

    fn end_frame(&mut self) -> io::Result<()> {
        (**self).end_frame()
    }

    fn supports_scroll(&self) -> bool {
        (**self).supports_scroll()
    }
}

/// Escape-sequence provider for one terminal type.
pub trait TerminalCapabilities {
    fn move_cursor(&self, w: &mut dyn Write, x: u16, y: u16) -> io::Result<()>;

    fn set_attr(&self, w: &mut dyn Write, attr: Attr) -> io::Result<()>;

    fn set_scroll_region(&self, w: &mut dyn Write, top: u16, bottom: u16) -> io::Result<()>;

    fn reset_scroll_region(&self, w: &mut dyn Write) -> io::Result<()>;

    fn scroll_up(&self, w: &mut dyn Write, n: u16) -> io::Result<()>;

    fn scroll_down(&self, w: &mut dyn Write, n: u16) -> io::Result<()>;

    fn supports_scroll_region(&self) -> bool {
        true
    }
}

/// Sink that encodes operations for a real terminal.
pub struct TerminalSink<W: Write, C: TerminalCapabilities> {
    writer: BufWriter<W>,
    caps: C,
}

impl<W: Write, C: TerminalCapabilities> TerminalSink<W, C> {
    pub fn new(writer: W, caps: C) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            caps,
        }
    }

    #[inline]
    pub fn capabilities(&self) -> &C {
        &self.caps
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write, C: TerminalCapabilities> OutputSink for TerminalSink<W, C> {
    fn emit(&mut self, op: Op<'_>) -> io::Result<()> {
        let w: &mut dyn Write = &mut self.writer;
        match op {
            Op::MoveCursor { x, y } => self.caps.move_cursor(w, x, y),
            Op::SetAttr(attr) => self.caps.set_attr(w, attr),
            Op::WriteRun(text) => w.write_all(text.as_bytes()),
            Op::SetScrollRegion { top, bottom } => self.caps.set_scroll_region(w, top, bottom),
            Op::ScrollUp(n) => self.caps.scroll_up(w, n),
            Op::ScrollDown(n) => self.caps.scroll_down(w, n),
            Op::ResetScrollRegion => self.caps.reset_scroll_region(w),
        }
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn supports_scroll(&self) -> bool {
        self.caps.supports_scroll_region()
    }
}

/// Sink that records every operation, grouped by frame.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    ops: Vec<Op<'static>>,
    frames: Vec<usize>,
    scroll: bool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            frames: Vec::new(),
            scroll: true,
        }
    }

    /// A sink that refuses scroll operations.
    pub fn without_scroll() -> Self {
        Self {
            scroll: false,
            ..Self::new()
        }
    }

    /// Every operation recorded so far.
    pub fn ops(&self) -> &[Op<'static>] {
        &self.ops
    }

    /// Number of completed frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Operations of the most recently completed frame.
    pub fn last_frame(&self) -> &[Op<'static>] {
        let end = self.frames.last().copied().unwrap_or(0);
        let start = self
            .frames
            .len()
            .checked_sub(2)
            .map_or(0, |i| self.frames[i]);
        &self.ops[start..end]
    }

    /// Concatenated text of every `WriteRun`.
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::WriteRun(t) => Some(t.as_ref()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.frames.clear();
    }
}

impl OutputSink for RecordingSink {
    fn emit(&mut self, op: Op<'_>) -> io::Result<()> {
        self.ops.push(op.into_owned());
        Ok(())
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.frames.push(self.ops.len());
        Ok(())
    }

    fn supports_scroll(&self) -> bool {
        self.scroll
    }
}
