#![forbid(unsafe_code)]

//! Compositor: one pre-order walk that resolves and paints every visible
//! node into the pending grid.
//!
//! For each visible node, in document order:
//!
//! 1. resolve its box against the parent's content box,
//! 2. fill the background inside the border (unless `NO_FILL`),
//! 3. draw the border, merging light-line junctions when docking,
//! 4. paint wrapped and aligned content clipped to the content box,
//! 5. recurse into the children.
//!
//! Resolved boxes and scroll candidate spans are collected into a
//! [`Composition`]; nothing is written back into the tree here, so a failed
//! walk leaves the nodes' cached boxes untouched.

use weft_core::{IRect, Rect};
use weft_layout::{
    Axis, ContentMeasure, Dim, DockNeighbor, DockScope, NodeGeometry, ParentBox, PositionResolver,
    ResolvedBox,
};
use weft_render::buffer::Buffer;
use weft_render::cell::{Cell, PackedAttr};
use weft_render::grapheme_pool::GraphemePool;
use weft_render::scroll::RowSpan;
use weft_text::{
    WrapMode, align_offset, display_width, expand_tabs, measure, valign_offset, wrap_text,
    wrapped_height,
};

use crate::config::ScreenConfig;
use crate::error::ScreenError;
use crate::node::{Node, NodeFlags, NodeId, NodeKind, Tree};
use crate::style::{BorderKind, BorderSet, Borders, merge_light};

/// Output of one composition walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    /// Every resolved node in paint order, degenerate boxes included.
    pub boxes: Vec<(NodeId, ResolvedBox)>,
    /// Row spans of full-width scrollable content.
    pub spans: Vec<RowSpan>,
}

/// Paint the subtree under the tree's root into `buf`.
///
/// `buf` is expected to be freshly cleared. On error the buffer holds a
/// partial frame and must not be diffed.
pub fn compose(
    tree: &Tree,
    config: &ScreenConfig,
    buf: &mut Buffer,
    pool: &mut GraphemePool,
) -> Result<Composition, ScreenError> {
    let parent = ParentBox::root(buf.width(), buf.height());
    let mut walk = Walk {
        tree,
        config,
        screen_width: i32::from(buf.width()),
        buf,
        pool,
        out: Composition::default(),
    };
    let mut siblings = Vec::new();
    walk.visit(tree.root(), &parent, None, &mut siblings)?;
    tracing::trace!(nodes = walk.out.boxes.len(), spans = walk.out.spans.len(), "composed");
    Ok(walk.out)
}

/// Resolve a single node against `parent` without painting.
pub(crate) fn resolve_one(
    tree: &Tree,
    config: &ScreenConfig,
    id: NodeId,
    node: &Node,
    parent: &ParentBox,
) -> Result<ResolvedBox, ScreenError> {
    let geometry = geometry(node);
    let measure = NodeMeasure {
        tree,
        node,
        tab_width: config.tab_width,
    };
    resolver(config, node)
        .resolve(&node.spec, &geometry, parent, &DockScope::EMPTY, &measure)
        .map_err(|source| ScreenError::Configuration { node: id, source })
}

fn geometry(node: &Node) -> NodeGeometry {
    NodeGeometry {
        insets: node.style.insets(),
        borders: node.style.borders().edges(),
        shrink: node.flags.contains(NodeFlags::SHRINK),
    }
}

fn docks(config: &ScreenConfig, node: &Node) -> bool {
    config.dock_borders || node.flags.contains(NodeFlags::DOCKED)
}

fn resolver(config: &ScreenConfig, node: &Node) -> PositionResolver {
    PositionResolver::new().dock_borders(docks(config, node))
}

struct Walk<'a> {
    tree: &'a Tree,
    config: &'a ScreenConfig,
    screen_width: i32,
    buf: &'a mut Buffer,
    pool: &'a mut GraphemePool,
    out: Composition,
}

impl Walk<'_> {
    fn visit(
        &mut self,
        id: NodeId,
        parent: &ParentBox,
        parent_dock: Option<DockNeighbor>,
        siblings: &mut Vec<DockNeighbor>,
    ) -> Result<(), ScreenError> {
        let tree = self.tree;
        let node = tree.node(id)?;
        if node.is_hidden() {
            return Ok(());
        }

        let geometry = geometry(node);
        let measure = NodeMeasure {
            tree,
            node,
            tab_width: self.config.tab_width,
        };
        let scope = DockScope::new(parent_dock, siblings);
        let resolved = resolver(self.config, node)
            .resolve(&node.spec, &geometry, parent, &scope, &measure)
            .map_err(|source| ScreenError::Configuration { node: id, source })?;
        self.out.boxes.push((id, resolved));

        let own_dock = geometry.borders.any().then_some(DockNeighbor {
            outer: resolved.outer,
            borders: geometry.borders,
        });
        if let Some(neighbor) = own_dock {
            siblings.push(neighbor);
        }
        if resolved.is_degenerate() {
            return Ok(());
        }

        self.paint_box(node, &resolved);
        self.paint_content(node, &resolved);
        self.collect_span(node, &resolved);

        let content_parent = resolved.as_parent(geometry.insets);
        let scrolled = content_parent.scrolled(node.kind.scroll_base() as i32);
        let mut child_siblings = Vec::new();
        for &child in node.children() {
            let fixed = tree
                .get(child)
                .is_some_and(|c| c.flags.contains(NodeFlags::FIXED));
            let pb = if fixed { &content_parent } else { &scrolled };
            self.visit(child, pb, own_dock, &mut child_siblings)?;
        }
        Ok(())
    }

    fn paint_box(&mut self, node: &Node, resolved: &ResolvedBox) {
        let Some(clip) = resolved.clipped.to_rect() else {
            return;
        };
        self.buf.push_scissor(clip);

        let style = &node.style;
        if !node.flags.contains(NodeFlags::NO_FILL) {
            let inside = resolved.outer.inner(style.borders().insets());
            if let Some(fill) = inside.intersection(&resolved.clipped).to_rect() {
                self.buf.fill(fill, Cell::blank(style.packed_attr()));
            }
        }

        if let Some(border) = style.border {
            let merge = docks(self.config, node)
                && matches!(border.kind, BorderKind::Light | BorderKind::Rounded);
            let painter = BorderPainter {
                outer: resolved.outer,
                set: border.kind.border_set(),
                top: border.sides.contains(Borders::TOP) && !resolved.clipped_edges.top,
                right: border.sides.contains(Borders::RIGHT)
                    && !resolved.clipped_edges.right,
                bottom: border.sides.contains(Borders::BOTTOM)
                    && !resolved.clipped_edges.bottom,
                left: border.sides.contains(Borders::LEFT)
                    && !resolved.clipped_edges.left,
            };
            painter.paint(self.buf, clip, border.attr.pack(), merge);
        }

        self.buf.pop_scissor();
    }

    fn paint_content(&mut self, node: &Node, resolved: &ResolvedBox) {
        if node.lines.is_empty() {
            return;
        }
        let style = &node.style;
        let content = resolved.content(style.insets());
        let visible = resolved.clipped.intersection(&content);
        let Some(scissor) = visible.to_rect() else {
            return;
        };

        let base = node.kind.scroll_base().min(node.lines.len());
        let text = expand_tabs(&node.lines[base..].join("\n"), self.config.tab_width);
        let mode = if style.wrap { WrapMode::WordChar } else { WrapMode::None };
        let content_w = content.width() as usize;
        let lines = wrap_text(&text, content_w, mode);

        let voff = match node.kind {
            NodeKind::ScrollableBox { .. } => 0,
            NodeKind::Box => valign_offset(lines.len(), content.height() as usize, style.valign),
        } as i32;
        let attr = style.packed_attr();

        self.buf.push_scissor(scissor);
        for (i, line) in lines.iter().enumerate() {
            let y = content.y + voff + i as i32;
            if y >= visible.bottom() {
                break;
            }
            if y < visible.y {
                continue;
            }
            let x = content.x + align_offset(display_width(line), content_w, style.align) as i32;
            self.buf.put_str(x, y, line, attr, self.pool);
        }
        self.buf.pop_scissor();
    }

    fn collect_span(&mut self, node: &Node, resolved: &ResolvedBox) {
        if !matches!(node.kind, NodeKind::ScrollableBox { .. }) {
            return;
        }
        if let Some(span) = full_width_rows(resolved, node, self.screen_width) {
            self.out.spans.push(span);
        }
    }
}

/// Visible content rows of a node spanning the whole screen width.
fn full_width_rows(
    resolved: &ResolvedBox,
    node: &Node,
    screen_width: i32,
) -> Option<RowSpan> {
    if resolved.clipped.x != 0 || resolved.clipped.width() != screen_width {
        return None;
    }
    let visible = resolved
        .clipped
        .intersection(&resolved.content(node.style.insets()));
    if visible.height() < 2 {
        return None;
    }
    Some(RowSpan::new(visible.y as u16, (visible.bottom() - 1) as u16))
}

struct BorderPainter {
    outer: IRect,
    set: BorderSet,
    top: bool,
    right: bool,
    bottom: bool,
    left: bool,
}

impl BorderPainter {
    fn glyph_at(&self, x: i32, y: i32) -> Option<char> {
        let o = self.outer;
        let on_top = self.top && y == o.y;
        let on_bottom = self.bottom && y == o.bottom() - 1;
        let on_left = self.left && x == o.x;
        let on_right = self.right && x == o.right() - 1;
        let set = &self.set;
        Some(match (on_top, on_bottom, on_left, on_right) {
            (true, _, true, _) => set.top_left,
            (true, _, _, true) => set.top_right,
            (_, true, true, _) => set.bottom_left,
            (_, true, _, true) => set.bottom_right,
            (true, _, _, _) | (_, true, _, _) => set.horizontal,
            (_, _, true, _) | (_, _, _, true) => set.vertical,
            _ => return None,
        })
    }

    fn paint(&self, buf: &mut Buffer, clip: Rect, attr: PackedAttr, merge: bool) {
        let o = self.outer;
        let x0 = i32::from(clip.x);
        let x1 = i32::from(clip.right());
        for y in i32::from(clip.y)..i32::from(clip.bottom()) {
            let edge_row = (self.top && y == o.y) || (self.bottom && y == o.bottom() - 1);
            if edge_row {
                for x in x0..x1 {
                    self.put(buf, x, y, attr, merge);
                }
            } else {
                let (left, right) = (o.x, o.right() - 1);
                for x in [left, right] {
                    if x >= x0 && x < x1 && (x == left || right != left) {
                        self.put(buf, x, y, attr, merge);
                    }
                }
            }
        }
    }

    fn put(&self, buf: &mut Buffer, x: i32, y: i32, attr: PackedAttr, merge: bool) {
        let Some(mut glyph) = self.glyph_at(x, y) else {
            return;
        };
        let (Ok(cx), Ok(cy)) = (u16::try_from(x), u16::try_from(y)) else {
            return;
        };
        if merge
            && let Some(existing) = buf.get(cx, cy).and_then(|c| c.content.as_char())
            && let Some(joined) = merge_light(existing, glyph)
        {
            glyph = joined;
        }
        buf.set(cx, cy, Cell::from_char(glyph).with_attr(attr));
    }
}

/// Shrink measurement for one node: its text plus the extents of children
/// whose placement does not depend on the parent size.
struct NodeMeasure<'a> {
    tree: &'a Tree,
    node: &'a Node,
    tab_width: usize,
}

impl NodeMeasure<'_> {
    fn text(&self) -> String {
        expand_tabs(&self.node.content(), self.tab_width)
    }

    fn child_extent(&self, child: &Node, axis: Axis) -> Option<i32> {
        if child.is_hidden() {
            return None;
        }
        let spec = child.spec.axis(axis);
        let start = match spec.start {
            Some(Dim::Abs(n)) => n,
            None if spec.end.is_none() => 0,
            _ => return None,
        };
        let shrink_flag = child.flags.contains(NodeFlags::SHRINK);
        let insets = child.style.insets();
        let m = NodeMeasure {
            tree: self.tree,
            node: child,
            tab_width: self.tab_width,
        };
        let size = match spec.size {
            Some(Dim::Abs(n)) => n,
            _ if spec.shrinks(shrink_flag) => match axis {
                Axis::Horizontal => m.natural_width() + i32::from(insets.horizontal_sum()),
                Axis::Vertical => {
                    let width = match child.spec.width {
                        Some(Dim::Abs(n)) => n - i32::from(insets.horizontal_sum()),
                        _ => m.natural_width(),
                    };
                    m.height_at(width.max(0)) + i32::from(insets.vertical_sum())
                }
            },
            _ => return None,
        };
        Some(start + size)
    }

    fn children_extent(&self, axis: Axis) -> i32 {
        self.node
            .children()
            .iter()
            .filter_map(|&id| self.tree.get(id))
            .filter_map(|child| self.child_extent(child, axis))
            .max()
            .unwrap_or(0)
    }
}

impl ContentMeasure for NodeMeasure<'_> {
    fn natural_width(&self) -> i32 {
        let text = measure(&self.text()).width as i32;
        text.max(self.children_extent(Axis::Horizontal))
    }

    fn height_at(&self, width: i32) -> i32 {
        let text = self.text();
        let lines = if self.node.style.wrap && width > 0 {
            wrapped_height(&text, width as usize, WrapMode::WordChar)
        } else {
            measure(&text).height
        };
        (lines as i32).max(self.children_extent(Axis::Vertical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Border, NodeStyle};
    use std::sync::Arc;
    use weft_layout::PositionSpec;

    fn row(buf: &Buffer, y: u16) -> String {
        buf.row_cells(y)
            .iter()
            .filter(|c| !c.is_continuation())
            .map(|c| c.content.as_char().unwrap_or('?'))
            .collect()
    }

    fn add(tree: &mut Tree, parent: NodeId, spec: PositionSpec, style: NodeStyle, text: &str) -> NodeId {
        let id = tree.create(NodeKind::Box);
        let node = tree.get_mut(id).expect("live");
        node.spec = spec;
        node.style = Arc::new(style);
        node.set_content(text);
        tree.append(parent, id).expect("attach");
        id
    }

    fn run(tree: &Tree, config: &ScreenConfig, w: u16, h: u16) -> (Buffer, Composition) {
        let mut buf = Buffer::new(w, h);
        let mut pool = GraphemePool::new();
        let out = compose(tree, config, &mut buf, &mut pool).expect("compose");
        (buf, out)
    }

    #[test]
    fn bordered_box_with_text() {
        let mut tree = Tree::new();
        let root = tree.root();
        add(
            &mut tree,
            root,
            PositionSpec::new().left(0).top(0).width(6).height(3),
            NodeStyle::new().border(Border::light()),
            "hi",
        );
        let (buf, _) = run(&tree, &ScreenConfig::default(), 8, 3);
        assert_eq!(row(&buf, 0), "┌────┐  ");
        assert_eq!(row(&buf, 1), "│hi  │  ");
        assert_eq!(row(&buf, 2), "└────┘  ");
    }

    #[test]
    fn alignment_in_content_box() {
        let mut tree = Tree::new();
        let root = tree.root();
        add(
            &mut tree,
            root,
            PositionSpec::new().left(0).top(0).width(6).height(3),
            NodeStyle::new()
                .align(weft_text::Align::Right)
                .valign(weft_text::VAlign::Bottom),
            "ab",
        );
        let (buf, _) = run(&tree, &ScreenConfig::default(), 6, 3);
        assert_eq!(row(&buf, 2), "    ab");
        assert_eq!(row(&buf, 0), "      ");
    }

    #[test]
    fn later_siblings_paint_on_top() {
        let mut tree = Tree::new();
        let root = tree.root();
        add(&mut tree, root, PositionSpec::new().left(0).top(0).width(4).height(1), NodeStyle::new(), "aaaa");
        add(&mut tree, root, PositionSpec::new().left(2).top(0).width(2).height(1), NodeStyle::new(), "bb");
        let (buf, _) = run(&tree, &ScreenConfig::default(), 4, 1);
        assert_eq!(row(&buf, 0), "aabb");
    }

    #[test]
    fn docked_siblings_share_junctions() {
        let mut tree = Tree::new();
        let root = tree.root();
        let style = NodeStyle::new().border(Border::light());
        add(&mut tree, root, PositionSpec::new().left(0).top(0).width(4).height(3), style.clone(), "");
        add(&mut tree, root, PositionSpec::new().left(4).top(0).width(4).height(3), style, "");
        let config = ScreenConfig::default().dock_borders(true);
        let (buf, _) = run(&tree, &config, 8, 3);
        assert_eq!(row(&buf, 0), "┌──┬───┐");
        assert_eq!(row(&buf, 1), "│  │   │");
        assert_eq!(row(&buf, 2), "└──┴───┘");
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let mut tree = Tree::new();
        let root = tree.root();
        let parent = add(&mut tree, root, PositionSpec::new(), NodeStyle::new(), "");
        let child = add(&mut tree, parent, PositionSpec::new(), NodeStyle::new(), "x");
        tree.get_mut(parent).expect("live").flags |= NodeFlags::HIDDEN;
        let (buf, out) = run(&tree, &ScreenConfig::default(), 2, 1);
        assert_eq!(row(&buf, 0), "  ");
        assert!(out.boxes.iter().all(|(id, _)| *id != parent && *id != child));
    }

    #[test]
    fn degenerate_parent_skips_children() {
        let mut tree = Tree::new();
        let root = tree.root();
        let parent = add(&mut tree, root, PositionSpec::new().left(50).width(3).height(1), NodeStyle::new(), "");
        let child = add(&mut tree, parent, PositionSpec::new(), NodeStyle::new(), "x");
        let (_, out) = run(&tree, &ScreenConfig::default(), 10, 2);
        let parent_box = out.boxes.iter().find(|(id, _)| *id == parent).map(|(_, b)| *b);
        assert!(parent_box.is_some_and(|b| b.is_degenerate()));
        assert!(out.boxes.iter().all(|(id, _)| *id != child));
    }

    #[test]
    fn scrollable_full_width_registers_span() {
        let mut tree = Tree::new();
        let root = tree.root();
        let id = tree.create(NodeKind::scrollable());
        tree.append(root, id).expect("attach");
        tree.get_mut(id).expect("live").set_content("a\nb\nc\nd\ne");
        let (buf, out) = run(&tree, &ScreenConfig::default(), 3, 4);
        assert_eq!(out.spans, vec![RowSpan::new(0, 3)]);
        assert_eq!(row(&buf, 0), "a  ");

        if let Some(node) = tree.get_mut(id) {
            node.kind = NodeKind::ScrollableBox { base: 2 };
        }
        let (buf, _) = run(&tree, &ScreenConfig::default(), 3, 4);
        assert_eq!(row(&buf, 0), "c  ");
        assert_eq!(row(&buf, 2), "e  ");
    }

    #[test]
    fn shrink_wraps_children_with_fixed_extent() {
        let mut tree = Tree::new();
        let root = tree.root();
        let parent = add(
            &mut tree,
            root,
            PositionSpec::new().left(0).top(0).width(weft_layout::Dim::Shrink).height(weft_layout::Dim::Shrink),
            NodeStyle::new().border(Border::light().sides(Borders::ALL)),
            "",
        );
        add(&mut tree, parent, PositionSpec::new().left(1).top(0).width(5).height(2), NodeStyle::new(), "");
        let (_, out) = run(&tree, &ScreenConfig::default(), 20, 10);
        let b = out.boxes.iter().find(|(id, _)| *id == parent).map(|(_, b)| *b).expect("resolved");
        assert_eq!((b.outer.width(), b.outer.height()), (8, 4));
    }
}
