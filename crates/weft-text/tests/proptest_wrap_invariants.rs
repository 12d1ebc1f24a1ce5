//! Property-based invariant tests for wrapping and width measurement.
//!
//! 1. Word/char-fallback wrapping never yields a line wider than the limit.
//! 2. Char wrapping preserves every grapheme in order.
//! 3. `display_width` is additive over grapheme clusters.
//! 4. `truncate_to_width` never exceeds its limit.

use proptest::prelude::*;
use weft_text::{WrapMode, clusters, display_width, truncate_to_width, wrap_text};

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("a"),
            Just("word"),
            Just(" "),
            Just("  "),
            Just("日本"),
            Just("😀"),
            Just("e\u{301}"),
            Just("\n"),
            Just("Supercalifragilistic"),
        ],
        0..24,
    )
    .prop_map(|parts| parts.concat())
}

// ═══════════════════════════════════════════════════════════════════════════
// Wrapping
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn word_char_lines_fit(text in text_strategy(), width in 2usize..40) {
        for line in wrap_text(&text, width, WrapMode::WordChar) {
            prop_assert!(display_width(&line) <= width, "{:?} wider than {}", line, width);
        }
    }

    #[test]
    fn char_wrap_preserves_content(text in text_strategy(), width in 2usize..40) {
        let lines = wrap_text(&text, width, WrapMode::Char);
        prop_assert_eq!(lines.concat(), text.replace('\n', ""));
    }

    #[test]
    fn char_wrap_lines_fit(text in text_strategy(), width in 2usize..40) {
        for line in wrap_text(&text, width, WrapMode::Char) {
            prop_assert!(display_width(&line) <= width);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Width
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn width_is_sum_of_clusters(text in text_strategy()) {
        let summed: usize = clusters(&text).map(|(_, w)| w).sum();
        prop_assert_eq!(display_width(&text), summed);
    }

    #[test]
    fn truncate_fits(text in text_strategy(), limit in 0usize..30) {
        let cut = truncate_to_width(&text, limit);
        prop_assert!(display_width(cut) <= limit);
        prop_assert!(text.starts_with(cut));
    }
}
