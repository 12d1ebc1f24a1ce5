#![forbid(unsafe_code)]

//! Border docking.
//!
//! Two bordered boxes that touch would normally draw two parallel border
//! lines. Docking pulls the later box's edge out by one cell so both borders
//! land on the same line:
//!
//! ```text
//! ┌──┐┌──┐      ┌──┬──┐
//! │a ││b │  ->  │a │b │
//! └──┘└──┘      └──┴──┘
//! ```
//!
//! The same applies to a child whose border sits just inside its parent's
//! border. Junction glyphs are chosen at paint time.

use weft_core::IRect;

/// Which sides of a box carry a border line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edges {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Edges {
    pub const NONE: Self = Self {
        top: false,
        right: false,
        bottom: false,
        left: false,
    };

    pub const ALL: Self = Self {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    #[inline]
    pub const fn any(&self) -> bool {
        self.top || self.right || self.bottom || self.left
    }
}

/// An already-placed bordered box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockNeighbor {
    /// Unclipped outer box (border included).
    pub outer: IRect,
    pub borders: Edges,
}

/// Boxes a node may dock against: its parent and the siblings resolved
/// before it in document order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockScope<'a> {
    pub parent: Option<DockNeighbor>,
    pub siblings: &'a [DockNeighbor],
}

impl<'a> DockScope<'a> {
    pub const EMPTY: DockScope<'static> = DockScope {
        parent: None,
        siblings: &[],
    };

    pub const fn new(parent: Option<DockNeighbor>, siblings: &'a [DockNeighbor]) -> Self {
        Self { parent, siblings }
    }
}

#[inline]
const fn spans_overlap(a0: i32, a1: i32, b0: i32, b1: i32) -> bool {
    a0 < b1 && b0 < a1
}

/// Extend `outer` so that its borders share a line with touching borders
/// in `scope`. Returns the docked box and the sides that moved.
pub fn dock(outer: IRect, borders: Edges, scope: &DockScope<'_>) -> (IRect, Edges) {
    let mut moved = Edges::NONE;
    if !borders.any() || outer.is_empty() {
        return (outer, moved);
    }

    for sib in scope.siblings {
        if sib.outer.is_empty() {
            continue;
        }
        let rows = spans_overlap(outer.y, outer.bottom(), sib.outer.y, sib.outer.bottom());
        let cols = spans_overlap(outer.x, outer.right(), sib.outer.x, sib.outer.right());
        if rows {
            moved.left |= borders.left && sib.borders.right && outer.x == sib.outer.right();
            moved.right |= borders.right && sib.borders.left && outer.right() == sib.outer.x;
        }
        if cols {
            moved.top |= borders.top && sib.borders.bottom && outer.y == sib.outer.bottom();
            moved.bottom |= borders.bottom && sib.borders.top && outer.bottom() == sib.outer.y;
        }
    }

    if let Some(parent) = scope.parent
        && !parent.outer.is_empty()
    {
        let p = parent.outer;
        moved.left |= borders.left && parent.borders.left && outer.x == p.x + 1;
        moved.top |= borders.top && parent.borders.top && outer.y == p.y + 1;
        moved.right |= borders.right && parent.borders.right && outer.right() == p.right() - 1;
        moved.bottom |= borders.bottom && parent.borders.bottom && outer.bottom() == p.bottom() - 1;
    }

    let mut x = outer.x;
    let mut y = outer.y;
    let mut w = outer.width();
    let mut h = outer.height();
    if moved.left {
        x -= 1;
        w += 1;
    }
    if moved.right {
        w += 1;
    }
    if moved.top {
        y -= 1;
        h += 1;
    }
    if moved.bottom {
        h += 1;
    }
    (IRect::new(x, y, w, h), moved)
}
