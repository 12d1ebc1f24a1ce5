#![forbid(unsafe_code)]

//! Render kernel: cells, grids, scroll detection, diffs, and presentation.
//!
//! A frame is drawn into the pending [`Buffer`] of a [`FramePair`],
//! compared against the displayed one by [`FrameDiff`], and lowered into
//! abstract output operations by the [`Presenter`]. Escape bytes only
//! appear at the edge, inside a [`TerminalCapabilities`] provider.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod diff;
pub mod frame;
pub mod grapheme_pool;
pub mod presenter;
pub mod scroll;
pub mod sink;

pub use ansi::AnsiCapabilities;
pub use buffer::Buffer;
pub use cell::{Attr, Cell, CellContent, Color, GraphemeId, PackedAttr, StyleFlags};
pub use diff::{DiffOp, FrameDiff, Region};
pub use frame::FramePair;
pub use grapheme_pool::GraphemePool;
pub use presenter::{PresentStats, Presenter};
pub use scroll::{RowSpan, ScrollConfig, ScrollOp, Shift};
pub use sink::{Op, OutputSink, RecordingSink, TerminalCapabilities, TerminalSink};
