//! Property-based soundness tests for scroll detection.
//!
//! Whatever the detector claims must be true: every row of a claimed run
//! equals its source row, the claimed shift stays inside the span, and the
//! rows it saves meet the configured threshold. Inputs include frames whose
//! rows are a random permutation of each other, wide glyphs included.

use proptest::prelude::*;
use weft_render::buffer::Buffer;
use weft_render::cell::{Cell, PackedAttr};
use weft_render::diff::FrameDiff;
use weft_render::grapheme_pool::GraphemePool;
use weft_render::scroll::{self, RowSpan, ScrollConfig, Shift};

const W: u16 = 4;
const H: u16 = 10;

/// Each row is one letter repeated; `b' '` rows are blank.
fn rows() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop_oneof![Just(b' '), b'a'..=b'e'], H as usize)
}

/// Non-blank letters, for content that must survive a shift intact.
fn letters() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'e', H as usize)
}

/// Text rows and a shuffled copy of them.
fn permuted_rows() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    prop::collection::vec("[ab日 ]{0,4}", H as usize)
        .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
}

fn text_grid(rows: &[String], pool: &mut GraphemePool) -> Buffer {
    let mut buf = Buffer::new(W, H);
    for (y, text) in rows.iter().enumerate() {
        buf.put_str(0, y as i32, text, PackedAttr::DEFAULT, pool);
    }
    buf
}

fn grid(rows: &[u8]) -> Buffer {
    let mut buf = Buffer::new(W, H);
    for (y, &c) in rows.iter().enumerate() {
        for x in 0..W {
            buf.set(x, y as u16, Cell::from_char(c as char));
        }
    }
    buf
}

fn row_eq(a: &Buffer, ay: u16, b: &Buffer, by: u16) -> bool {
    a.row_cells(ay) == b.row_cells(by)
}

// ═══════════════════════════════════════════════════════════════════════════
// Claimed runs are real
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn claimed_run_rows_match_source(old in rows(), new in rows(), top in 0u16..H, len in 1u16..H) {
        let displayed = grid(&old);
        let pending = grid(&new);
        let span = RowSpan::new(top, (top + len).min(H - 1));

        if let Some(op) = scroll::detect(&displayed, &pending, span, &ScrollConfig::default()) {
            prop_assert!(op.run >= 1);
            prop_assert!(op.shift.rows() < span.rows());
            let start = op.run_start();
            for r in start..start + op.run {
                prop_assert!(span.contains(r));
                prop_assert!(row_eq(&pending, r, &displayed, op.source_row(r)));
            }
        }
    }

    #[test]
    fn permuted_rows_claim_only_true_runs((old, new) in permuted_rows(), top in 0u16..H, len in 1u16..H) {
        let mut pool = GraphemePool::new();
        let displayed = text_grid(&old, &mut pool);
        let pending = text_grid(&new, &mut pool);
        let span = RowSpan::new(top, (top + len).min(H - 1));

        if let Some(op) = scroll::detect(&displayed, &pending, span, &ScrollConfig::default()) {
            let start = op.run_start();
            for r in start..start + op.run {
                prop_assert!(span.contains(r));
                prop_assert!(row_eq(&pending, r, &displayed, op.source_row(r)));
            }
        }

        let diff = FrameDiff::compute_with_scroll(&displayed, &pending, &[span], &ScrollConfig::default());
        let mut replay = displayed.clone();
        diff.apply(&mut replay, &pending);
        prop_assert_eq!(replay, pending);
    }

    #[test]
    fn shifted_content_is_detected(content in letters(), n in 1u16..4) {
        let displayed = grid(&content);
        let mut shifted = content[n as usize..].to_vec();
        shifted.resize(H as usize, b' ');
        let pending = grid(&shifted);
        let baseline = (0..H).filter(|&y| !row_eq(&displayed, y, &pending, y)).count();
        prop_assume!(baseline >= 2);

        let op = scroll::detect(&displayed, &pending, RowSpan::new(0, H - 1), &ScrollConfig::default());
        let op = op.expect("a pure upward shift saves rows");
        // A periodic column can make a smaller shift equally good, never better.
        let mut replay = displayed.clone();
        replay.scroll_rows(0, H - 1, op.shift.signed());
        let remaining = (0..H).filter(|&y| !row_eq(&replay, y, &pending, y)).count();
        prop_assert_eq!(remaining, 0, "shift {:?} leaves rows to rewrite", op.shift);
        prop_assert!(matches!(op.shift, Shift::Up(k) if k <= n));
    }

    #[test]
    fn disabled_config_never_scrolls(old in rows(), new in rows()) {
        let diff = FrameDiff::compute_with_scroll(
            &grid(&old),
            &grid(&new),
            &[RowSpan::new(0, H - 1)],
            &ScrollConfig::DISABLED,
        );
        prop_assert!(diff.scrolls().is_empty());
    }

    #[test]
    fn scroll_never_costs_more_than_plain_diff(old in rows(), new in rows()) {
        let displayed = grid(&old);
        let pending = grid(&new);
        let plain = FrameDiff::compute(&displayed, &pending);
        let scrolled = FrameDiff::compute_with_scroll(
            &displayed,
            &pending,
            &[RowSpan::new(0, H - 1)],
            &ScrollConfig::default(),
        );
        if !scrolled.scrolls().is_empty() {
            prop_assert!(scrolled.regions().len() + 2 <= plain.regions().len());
        }
    }
}
