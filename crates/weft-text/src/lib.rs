#![forbid(unsafe_code)]

//! Text measurement for the compositor.
//!
//! - [`width`] is the single source of truth for how many terminal columns a
//!   grapheme occupies. Shrink sizing, word wrapping and the cell grid all go
//!   through it, so they can never disagree about where a column boundary is.
//! - [`wrap`] breaks content into lines and computes alignment offsets.
//!
//! # Example
//! ```
//! use weft_text::{display_width, wrap_text, WrapMode};
//!
//! assert_eq!(display_width("日本"), 4);
//! let lines = wrap_text("Hello world foo bar", 10, WrapMode::Word);
//! assert_eq!(lines, vec!["Hello", "world foo", "bar"]);
//! ```

pub mod width;
pub mod wrap;

pub use width::{
    WidthClass, char_class, char_width, clusters, display_width, grapheme_class, grapheme_width,
    graphemes,
};
pub use wrap::{
    Align, Extent, VAlign, WrapMode, align_offset, expand_tabs, measure, truncate_to_width,
    valign_offset, wrap_text, wrapped_height,
};
