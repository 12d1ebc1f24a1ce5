#![forbid(unsafe_code)]

//! weft public facade crate.
//!
//! Re-exports the screen compositor's public surface from the internal
//! crates and offers a prelude for day-to-day usage.
//!
//! ```
//! use weft::prelude::*;
//!
//! let mut screen = Screen::new(20, 2, ScreenConfig::default());
//! let root = screen.root();
//! let label = screen.tree_mut().create(NodeKind::Box);
//! screen.tree_mut().append(root, label).unwrap();
//! screen.set_content(label, "ready").unwrap();
//!
//! let mut presenter = Presenter::new();
//! let mut sink = weft::terminal_sink(Vec::new());
//! screen.render_to(&mut presenter, &mut sink).unwrap();
//! let bytes = sink.into_inner().unwrap();
//! assert!(String::from_utf8_lossy(&bytes).contains("ready"));
//! ```

use std::io::Write;

// --- Geometry and text -----------------------------------------------------

pub use weft_core::{IRect, Rect, Sides};
pub use weft_text::{Align, VAlign, WrapMode, display_width};

// --- Render re-exports -----------------------------------------------------

pub use weft_render::{
    AnsiCapabilities, Attr, Buffer, Cell, Color, FrameDiff, GraphemePool, Op, OutputSink,
    PackedAttr, PresentStats, Presenter, RecordingSink, Region, ScrollConfig, ScrollOp, Shift,
    StyleFlags, TerminalCapabilities, TerminalSink,
};

// --- Layout re-exports -----------------------------------------------------

pub use weft_layout::{Dim, LayoutError, PositionSpec, ResolvedBox};

// --- Screen re-exports -----------------------------------------------------

pub use weft_screen::{
    Border, BorderKind, Borders, NodeFlags, NodeId, NodeKind, NodeStyle, RenderHandle, Screen,
    ScreenConfig, ScreenError, StructuralReason, Tree,
};

/// Standard result type for weft APIs.
pub type Result<T> = std::result::Result<T, ScreenError>;

/// A terminal sink writing ANSI sequences to `writer`, with capabilities
/// detected from the environment.
pub fn terminal_sink<W: Write>(writer: W) -> TerminalSink<W, AnsiCapabilities> {
    TerminalSink::new(writer, AnsiCapabilities::from_env())
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Attr, Border, Borders, Color, Dim, NodeFlags, NodeId, NodeKind, NodeStyle, OutputSink,
        PositionSpec, Presenter, Result, Screen, ScreenConfig, ScreenError, StyleFlags,
    };

    pub use crate::{core, layout, render, screen, text};
}

pub use weft_core as core;
pub use weft_layout as layout;
pub use weft_render as render;
pub use weft_screen as screen;
pub use weft_text as text;
