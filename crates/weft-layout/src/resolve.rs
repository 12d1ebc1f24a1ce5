#![forbid(unsafe_code)]

//! Position resolution.
//!
//! Resolution is single-pass and top-down. A node's [`PositionSpec`] is
//! resolved against its parent's final content box ([`ParentBox`]); the
//! result is clipped to the parent's visible content area. A box that ends
//! up with no visible area is degenerate, which is a normal outcome.
//!
//! # Axis rules
//!
//! For each axis, with `available` the parent content extent:
//!
//! | Size term      | Resolved size |
//! |----------------|---------------|
//! | absolute / %   | the term |
//! | `shrink`       | content extent + insets, capped at `available` |
//! | missing        | `available - start - end` (missing terms count 0) |
//!
//! | Start term     | Resolved offset |
//! |----------------|-----------------|
//! | absolute / %   | the term |
//! | `center`       | `floor((available - size) / 2)` |
//! | missing, end set | `available - size - end` |
//! | missing        | 0 |

use weft_core::{IRect, Sides};

use crate::dock::{DockScope, Edges, dock};
use crate::error::{Axis, LayoutError};
use crate::position::{AxisSpec, Dim, PositionSpec};

/// Content extent provider for shrink sizing.
///
/// Extents exclude the node's own border and padding.
pub trait ContentMeasure {
    /// Width the content needs without wrapping.
    fn natural_width(&self) -> i32;

    /// Height the content needs when laid out `width` cells wide.
    fn height_at(&self, width: i32) -> i32;
}

/// A node with no content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl ContentMeasure for NoContent {
    fn natural_width(&self) -> i32 {
        0
    }

    fn height_at(&self, _width: i32) -> i32 {
        0
    }
}

impl<F> ContentMeasure for F
where
    F: Fn(Option<i32>) -> (i32, i32),
{
    fn natural_width(&self) -> i32 {
        self(None).0
    }

    fn height_at(&self, width: i32) -> i32 {
        self(Some(width)).1
    }
}

/// The already-resolved box a child is positioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentBox {
    /// Content box in absolute coordinates (border and padding removed).
    pub content: IRect,
    /// Visible part of the content box; children are clipped to it.
    pub clip: IRect,
    /// Visible part of the parent's outer box. Edges docked onto the
    /// parent's border are clipped to this instead of `clip`.
    pub border_clip: IRect,
}

impl ParentBox {
    /// The screen itself: everything visible, no border.
    pub fn root(width: u16, height: u16) -> Self {
        let area = IRect::new(0, 0, i32::from(width), i32::from(height));
        Self {
            content: area,
            clip: area,
            border_clip: area,
        }
    }

    /// Same visible area, content shifted up by `rows` (a scrolled view).
    #[must_use]
    pub fn scrolled(self, rows: i32) -> Self {
        Self {
            content: self.content.offset(0, -rows),
            ..self
        }
    }
}

/// Which edges of a box were cut by the parent clip.
pub type ClippedEdges = Edges;

/// Layout inputs of one node besides its position spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeGeometry {
    /// Border plus padding.
    pub insets: Sides,
    /// Sides carrying a border line (docking candidates).
    pub borders: Edges,
    /// Node-level shrink flag.
    pub shrink: bool,
}

/// Result of resolving one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedBox {
    /// Unclipped box in absolute coordinates.
    pub outer: IRect,
    /// `outer` intersected with the parent's visible content area.
    pub clipped: IRect,
    /// Offset of `outer` from the parent's content origin.
    pub rel_left: i32,
    pub rel_top: i32,
    /// Edges cut by the clip.
    pub clipped_edges: ClippedEdges,
    /// Edges extended by docking.
    pub docked: Edges,
}

impl ResolvedBox {
    /// No visible cells.
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        self.clipped.is_empty()
    }

    /// Content box (unclipped).
    #[inline]
    pub fn content(&self, insets: Sides) -> IRect {
        self.outer.inner(insets)
    }

    /// The box children of this node are positioned in.
    pub fn as_parent(&self, insets: Sides) -> ParentBox {
        let content = self.content(insets);
        ParentBox {
            content,
            clip: self.clipped.intersection(&content),
            border_clip: self.clipped,
        }
    }

    /// Whether the visible part contains an absolute point.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.clipped.contains(x, y)
    }
}

/// Stateless position resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionResolver {
    dock_borders: bool,
}

impl PositionResolver {
    pub const fn new() -> Self {
        Self {
            dock_borders: false,
        }
    }

    #[must_use]
    pub const fn dock_borders(mut self, enabled: bool) -> Self {
        self.dock_borders = enabled;
        self
    }

    #[inline]
    pub const fn docks_borders(&self) -> bool {
        self.dock_borders
    }

    /// Resolve one node.
    ///
    /// Errors only on a self-contradictory spec; geometry that does not fit
    /// yields a degenerate box instead.
    pub fn resolve(
        &self,
        spec: &PositionSpec,
        geometry: &NodeGeometry,
        parent: &ParentBox,
        scope: &DockScope<'_>,
        content: &dyn ContentMeasure,
    ) -> Result<ResolvedBox, LayoutError> {
        spec.validate(geometry.shrink)?;

        let avail_w = parent.content.width();
        let avail_h = parent.content.height();
        let insets = geometry.insets;
        let h_insets = i32::from(insets.horizontal_sum());
        let v_insets = i32::from(insets.vertical_sum());

        let horizontal = spec.axis(Axis::Horizontal);
        let width = if horizontal.shrinks(geometry.shrink) {
            shrink_extent(content.natural_width(), h_insets, avail_w)
        } else {
            declared_size(&horizontal, avail_w)
        };

        let vertical = spec.axis(Axis::Vertical);
        let height = if vertical.shrinks(geometry.shrink) {
            let inner_w = (width - h_insets).max(0);
            shrink_extent(content.height_at(inner_w), v_insets, avail_h)
        } else {
            declared_size(&vertical, avail_h)
        };

        let rel_left = offset(&horizontal, avail_w, width);
        let rel_top = offset(&vertical, avail_h, height);
        let mut outer = IRect::new(
            parent.content.x + rel_left,
            parent.content.y + rel_top,
            width,
            height,
        );

        let mut docked = Edges::NONE;
        if self.dock_borders {
            (outer, docked) = dock(outer, geometry.borders, scope);
        }

        let clip = docked_clip(parent, scope, docked);
        let clipped = outer.intersection(&clip);
        let clipped_edges = Edges {
            top: clipped.y > outer.y,
            right: clipped.right() < outer.right(),
            bottom: clipped.bottom() < outer.bottom(),
            left: clipped.x > outer.x,
        };

        Ok(ResolvedBox {
            outer,
            clipped,
            rel_left: outer.x - parent.content.x,
            rel_top: outer.y - parent.content.y,
            clipped_edges,
            docked,
        })
    }
}

fn shrink_extent(content: i32, insets: i32, available: i32) -> i32 {
    content
        .max(0)
        .saturating_add(insets)
        .min(available.max(0))
}

fn declared_size(axis: &AxisSpec, available: i32) -> i32 {
    if let Some(size) = axis.size.and_then(|d| d.length(available)) {
        return size.max(0);
    }
    let start = axis.start.and_then(|d| d.length(available)).unwrap_or(0);
    let end = axis.end.and_then(|d| d.length(available)).unwrap_or(0);
    (available - start - end).max(0)
}

fn offset(axis: &AxisSpec, available: i32, size: i32) -> i32 {
    match axis.start {
        Some(Dim::Center) => (available - size).div_euclid(2),
        Some(dim) => dim.length(available).unwrap_or(0),
        None => match axis.end.and_then(|d| d.length(available)) {
            Some(end) => available - size - end,
            None => 0,
        },
    }
}

/// Clip rectangle for a node: the parent's visible content area, widened
/// onto the parent's border on every side that docked into it.
fn docked_clip(parent: &ParentBox, scope: &DockScope<'_>, docked: Edges) -> IRect {
    if scope.parent.is_none() || !docked.any() {
        return parent.clip;
    }
    let c = parent.clip;
    let b = parent.border_clip;
    let left = if docked.left { b.x } else { c.x };
    let top = if docked.top { b.y } else { c.y };
    let right = if docked.right { b.right() } else { c.right() };
    let bottom = if docked.bottom { b.bottom() } else { c.bottom() };
    IRect::new(left, top, right - left, bottom - top).intersection(&b)
}
