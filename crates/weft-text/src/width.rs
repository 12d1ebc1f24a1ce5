#![forbid(unsafe_code)]

//! Terminal column width classification.
//!
//! Every character is classified into a [`WidthClass`]: zero-width
//! (combining marks, joiners, variation selectors, control codes), narrow, or
//! wide (East Asian wide/fullwidth and emoji). Widths are assigned per
//! grapheme cluster, so a base character followed by combining marks, or a
//! ZWJ emoji sequence, is measured as one atomic unit.
//!
//! Rust strings hold Unicode scalar values, so a UTF-16 surrogate pair has
//! already been folded into a single `char` by the time it reaches here.
//!
//! # Consumers
//!
//! Shrink-to-content sizing, word wrap and wide-character placeholder
//! insertion in the cell grid all call [`grapheme_width`]. Keeping exactly one
//! classifier is what keeps emoji/CJK columns aligned.

use unicode_segmentation::{Graphemes, UnicodeSegmentation};
use unicode_width::UnicodeWidthChar;

/// Number of terminal columns a character or grapheme occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum WidthClass {
    /// Attaches to the previous cell (combining marks, joiners, controls).
    Zero = 0,
    /// One column.
    Narrow = 1,
    /// Two columns; the second column is a continuation cell.
    Wide = 2,
}

impl WidthClass {
    /// Column count for this class.
    #[inline]
    pub const fn cells(self) -> usize {
        self as usize
    }
}

#[inline]
fn is_zero_width_codepoint(c: char) -> bool {
    let u = c as u32;
    matches!(u, 0x0000..=0x001F | 0x007F..=0x009F)
        || matches!(u, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
        || matches!(u, 0xFE20..=0xFE2F)
        || matches!(u, 0xFE00..=0xFE0F | 0xE0100..=0xE01EF)
        || matches!(
            u,
            0x00AD | 0x034F | 0x180E | 0x200B | 0x200C | 0x200D | 0x200E | 0x200F | 0x2060 | 0xFEFF
        )
        || matches!(u, 0x202A..=0x202E | 0x2066..=0x2069)
}

#[inline]
fn is_probable_emoji(c: char) -> bool {
    let u = c as u32;
    matches!(u, 0x1F000..=0x1FAFF) && !matches!(u, 0x1F3FB..=0x1F3FF)
}

/// Classify a single character.
#[inline]
pub fn char_class(c: char) -> WidthClass {
    if c.is_ascii() {
        return if (' '..='~').contains(&c) {
            WidthClass::Narrow
        } else {
            WidthClass::Zero
        };
    }
    if is_zero_width_codepoint(c) {
        return WidthClass::Zero;
    }
    if is_probable_emoji(c) {
        return WidthClass::Wide;
    }
    match c.width() {
        None | Some(0) => WidthClass::Zero,
        Some(1) => WidthClass::Narrow,
        Some(_) => WidthClass::Wide,
    }
}

/// Column width of a single character (0, 1 or 2).
#[inline]
pub fn char_width(c: char) -> usize {
    char_class(c).cells()
}

/// Classify a grapheme cluster.
///
/// A single-character cluster is classified exactly like [`char_class`]. A
/// multi-character cluster is wide if any member is wide or the cluster
/// requests emoji presentation (U+FE0F); otherwise it is as wide as its
/// widest member.
pub fn grapheme_class(grapheme: &str) -> WidthClass {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return WidthClass::Zero;
    };
    if chars.as_str().is_empty() {
        return char_class(first);
    }
    let mut class = WidthClass::Zero;
    for c in grapheme.chars() {
        if c == '\u{FE0F}' {
            return WidthClass::Wide;
        }
        class = class.max(char_class(c));
    }
    class
}

/// Column width of a grapheme cluster (0, 1 or 2).
#[inline]
pub fn grapheme_width(grapheme: &str) -> usize {
    grapheme_class(grapheme).cells()
}

/// Extended grapheme clusters of `text`.
#[inline]
pub fn graphemes(text: &str) -> Graphemes<'_> {
    text.graphemes(true)
}

/// Grapheme clusters paired with their column width.
pub fn clusters(text: &str) -> impl Iterator<Item = (&str, usize)> {
    text.graphemes(true).map(|g| (g, grapheme_width(g)))
}

/// Total column width of `text`.
///
/// Equal, by construction, to the number of cells (heads plus continuation
/// placeholders) that writing `text` into an unclipped grid row occupies.
pub fn display_width(text: &str) -> usize {
    if text.is_ascii() {
        return text.bytes().filter(|b| (0x20..=0x7E).contains(b)).count();
    }
    text.graphemes(true).map(grapheme_width).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_narrow() {
        assert_eq!(char_class('a'), WidthClass::Narrow);
        assert_eq!(char_class(' '), WidthClass::Narrow);
        assert_eq!(display_width("Hello"), 5);
    }

    #[test]
    fn controls_are_zero_width() {
        assert_eq!(char_class('\u{1b}'), WidthClass::Zero);
        assert_eq!(char_class('\n'), WidthClass::Zero);
        assert_eq!(display_width("a\u{7}b"), 2);
    }

    #[test]
    fn cjk_is_wide() {
        assert_eq!(char_class('日'), WidthClass::Wide);
        assert_eq!(display_width("日本語"), 6);
    }

    #[test]
    fn combining_mark_joins_its_base() {
        let s = "e\u{301}";
        assert_eq!(graphemes(s).count(), 1);
        assert_eq!(grapheme_width(s), 1);
        assert_eq!(display_width("cafe\u{301}"), 4);
    }

    #[test]
    fn lone_combining_mark_is_zero() {
        assert_eq!(grapheme_width("\u{301}"), 0);
    }

    #[test]
    fn emoji_is_wide() {
        assert_eq!(grapheme_width("😀"), 2);
        // ZWJ family sequence is a single wide cluster.
        assert_eq!(grapheme_width("👨\u{200D}👩\u{200D}👧"), 2);
        // Text-default symbol forced to emoji presentation.
        assert_eq!(grapheme_width("☺\u{FE0F}"), 2);
    }

    #[test]
    fn single_char_cluster_matches_char_class() {
        for c in ['a', '日', '😀', '\u{301}', 'é', '─'] {
            let mut buf = [0u8; 4];
            assert_eq!(grapheme_width(c.encode_utf8(&mut buf)), char_width(c), "{c:?}");
        }
    }

    #[test]
    fn clusters_pair_width() {
        let widths: Vec<usize> = clusters("a日e\u{301}").map(|(_, w)| w).collect();
        assert_eq!(widths, vec![1, 2, 1]);
    }
}
