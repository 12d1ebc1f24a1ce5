#![forbid(unsafe_code)]

//! Width-correct wrapping, measurement and alignment.
//!
//! All widths come from [`crate::width`], so a line produced here occupies
//! exactly as many grid cells as its measured width.
//!
//! # Example
//! ```
//! use weft_text::wrap::{wrap_text, WrapMode};
//!
//! let lines = wrap_text("Supercalifragilistic", 10, WrapMode::WordChar);
//! assert_eq!(lines, vec!["Supercalif", "ragilistic"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::width::{display_width, grapheme_width, graphemes};

/// Text wrapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// No wrapping; lines may exceed the width.
    None,
    /// Wrap at grapheme boundaries.
    Char,
    /// Wrap at word boundaries; an overlong word keeps its own line.
    Word,
    /// Word wrap with grapheme fallback for overlong words.
    #[default]
    WordChar,
}

/// Horizontal alignment of a line inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment of a block of lines inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Natural extent of a block of text, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    /// Widest line.
    pub width: usize,
    /// Number of lines.
    pub height: usize,
}

impl Extent {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    /// Bounding extent of two blocks laid over each other.
    pub fn union(self, other: Extent) -> Extent {
        Extent {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }
}

/// Measure text without wrapping: widest line by line count.
///
/// Empty text has zero extent.
pub fn measure(text: &str) -> Extent {
    if text.is_empty() {
        return Extent::ZERO;
    }
    text.split('\n').fold(Extent::ZERO, |acc, line| Extent {
        width: acc.width.max(display_width(line)),
        height: acc.height + 1,
    })
}

/// Number of lines `text` occupies when wrapped at `width`.
pub fn wrapped_height(text: &str, width: usize, mode: WrapMode) -> usize {
    if text.is_empty() {
        return 0;
    }
    wrap_text(text, width, mode).len()
}

/// Wrap text to the specified width.
///
/// A width of zero disables wrapping.
#[must_use]
pub fn wrap_text(text: &str, width: usize, mode: WrapMode) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }
    match mode {
        WrapMode::None => text.split('\n').map(str::to_string).collect(),
        WrapMode::Char => wrap_chars(text, width),
        WrapMode::Word => wrap_words(text, width, false),
        WrapMode::WordChar => wrap_words(text, width, true),
    }
}

fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;
        for g in graphemes(paragraph) {
            let w = grapheme_width(g);
            if line_width + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push_str(g);
            line_width += w;
        }
        lines.push(line);
    }
    lines
}

fn wrap_words(text: &str, width: usize, char_fallback: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;
        wrap_paragraph(
            paragraph,
            width,
            char_fallback,
            &mut lines,
            &mut line,
            &mut line_width,
        );
        lines.push(line.trim_end().to_string());
    }
    lines
}

fn wrap_paragraph(
    text: &str,
    width: usize,
    char_fallback: bool,
    lines: &mut Vec<String>,
    line: &mut String,
    line_width: &mut usize,
) {
    for word in split_words(text) {
        let word_width = display_width(word);

        if *line_width + word_width <= width {
            line.push_str(word);
            *line_width += word_width;
            continue;
        }

        if !line.is_empty() {
            lines.push(line.trim_end().to_string());
            line.clear();
            *line_width = 0;
        }

        let trimmed = word.trim_start();
        let trimmed_width = display_width(trimmed);
        if trimmed_width > width {
            if char_fallback {
                wrap_long_word(trimmed, width, lines, line, line_width);
            } else {
                lines.push(trimmed.to_string());
            }
        } else {
            line.push_str(trimmed);
            *line_width = trimmed_width;
        }
    }
}

fn wrap_long_word(
    word: &str,
    width: usize,
    lines: &mut Vec<String>,
    line: &mut String,
    line_width: &mut usize,
) {
    for g in graphemes(word) {
        let w = grapheme_width(g);
        if *line_width + w > width && !line.is_empty() {
            lines.push(std::mem::take(line));
            *line_width = 0;
        }
        line.push_str(g);
        *line_width += w;
    }
}

/// Split into alternating runs of whitespace and non-whitespace.
fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_whitespace = None;
    for (idx, g) in text.grapheme_indices(true) {
        let is_ws = g.chars().all(char::is_whitespace);
        if let Some(prev) = in_whitespace
            && prev != is_ws
        {
            words.push(&text[start..idx]);
            start = idx;
        }
        in_whitespace = Some(is_ws);
    }
    if start < text.len() {
        words.push(&text[start..]);
    }
    words
}

/// Truncate text to fit within `max_width` columns.
///
/// Never splits a grapheme; a wide grapheme that would straddle the limit is
/// dropped.
#[must_use]
pub fn truncate_to_width(text: &str, max_width: usize) -> &str {
    let mut current = 0;
    for (idx, g) in text.grapheme_indices(true) {
        let w = grapheme_width(g);
        if current + w > max_width {
            return &text[..idx];
        }
        current += w;
    }
    text
}

/// Replace tabs with spaces up to the next multiple of `tab_width`.
///
/// A tab width of zero removes tabs.
pub fn expand_tabs(text: &str, tab_width: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + tab_width * 2);
    let mut column = 0;
    for g in graphemes(text) {
        match g {
            "\t" => {
                if tab_width > 0 {
                    let pad = tab_width - column % tab_width;
                    out.extend(std::iter::repeat_n(' ', pad));
                    column += pad;
                }
            }
            "\n" => {
                out.push('\n');
                column = 0;
            }
            _ => {
                out.push_str(g);
                column += grapheme_width(g);
            }
        }
    }
    out
}

/// Column offset of a line of `line_width` inside `available` columns.
#[inline]
pub fn align_offset(line_width: usize, available: usize, align: Align) -> usize {
    let slack = available.saturating_sub(line_width);
    match align {
        Align::Left => 0,
        Align::Center => slack / 2,
        Align::Right => slack,
    }
}

/// Row offset of a block of `lines` inside `available` rows.
#[inline]
pub fn valign_offset(lines: usize, available: usize, valign: VAlign) -> usize {
    let slack = available.saturating_sub(lines);
    match valign {
        VAlign::Top => 0,
        VAlign::Middle => slack / 2,
        VAlign::Bottom => slack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_text_no_wrap_needed() {
        assert_eq!(wrap_text("hello", 10, WrapMode::Word), vec!["hello"]);
    }

    #[test]
    fn wrap_text_multiple_words() {
        let lines = wrap_text("hello world foo bar", 11, WrapMode::Word);
        assert_eq!(lines, vec!["hello world", "foo bar"]);
    }

    #[test]
    fn wrap_text_preserves_newlines() {
        let lines = wrap_text("line1\nline2", 20, WrapMode::Word);
        assert_eq!(lines, vec!["line1", "line2"]);
    }

    #[test]
    fn wrap_text_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 20, WrapMode::WordChar);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_long_word_without_fallback_overflows() {
        let lines = wrap_text("supercalifragilistic", 10, WrapMode::Word);
        assert_eq!(lines, vec!["supercalifragilistic"]);
    }

    #[test]
    fn wrap_char_mode() {
        let lines = wrap_text("hello world", 5, WrapMode::Char);
        assert_eq!(lines, vec!["hello", " worl", "d"]);
    }

    #[test]
    fn wrap_never_splits_wide_chars() {
        let lines = wrap_text("日本語テキスト", 5, WrapMode::WordChar);
        for line in &lines {
            assert!(display_width(line) <= 5, "{line:?}");
        }
        assert_eq!(lines.concat(), "日本語テキスト");
    }

    #[test]
    fn measure_unwrapped() {
        assert_eq!(measure("Hello"), Extent { width: 5, height: 1 });
        assert_eq!(measure("ab\n日本語"), Extent { width: 6, height: 2 });
        assert_eq!(measure(""), Extent::ZERO);
    }

    #[test]
    fn wrapped_height_counts_lines() {
        assert_eq!(wrapped_height("aaa bbb ccc", 4, WrapMode::WordChar), 3);
        assert_eq!(wrapped_height("", 4, WrapMode::WordChar), 0);
    }

    #[test]
    fn truncate_respects_wide_boundary() {
        assert_eq!(truncate_to_width("ab日c", 3), "ab");
        assert_eq!(truncate_to_width("ab日c", 4), "ab日");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }

    #[test]
    fn tabs_expand_to_stops() {
        assert_eq!(expand_tabs("a\tb", 4), "a   b");
        assert_eq!(expand_tabs("\tx\n\ty", 2), "  x\n  y");
        assert_eq!(expand_tabs("a\tb", 0), "ab");
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(align_offset(4, 10, Align::Left), 0);
        assert_eq!(align_offset(4, 10, Align::Center), 3);
        assert_eq!(align_offset(4, 10, Align::Right), 6);
        assert_eq!(align_offset(12, 10, Align::Right), 0);
        assert_eq!(valign_offset(1, 5, VAlign::Middle), 2);
        assert_eq!(valign_offset(1, 5, VAlign::Bottom), 4);
    }
}
