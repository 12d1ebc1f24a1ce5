#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Two rectangle types are used across the workspace:
//!
//! - [`Rect`] addresses cells of a grid (unsigned, always on-screen).
//! - [`IRect`] is the layout-space rectangle. Offsets may be negative
//!   (a child scrolled above its parent, a box positioned off-screen) but the
//!   extent never is: a rectangle that would have negative width or height is
//!   stored with zero extent instead.

/// A rectangle on the cell grid.
///
/// Uses terminal coordinates (0-indexed, origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in cells.
    pub width: u16,
    /// Height in cells.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Area in cells.
    #[inline]
    pub const fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Compute the intersection with another rectangle.
    ///
    /// Returns an empty rectangle if the rectangles don't overlap.
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        self.intersection_opt(other).unwrap_or_default()
    }

    /// Compute the intersection with another rectangle, returning `None` if no overlap.
    #[inline]
    pub fn intersection_opt(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Shrink the rectangle by the given insets.
    pub fn inner(&self, insets: Sides) -> Rect {
        Rect {
            x: self.x.saturating_add(insets.left),
            y: self.y.saturating_add(insets.top),
            width: self.width.saturating_sub(insets.horizontal_sum()),
            height: self.height.saturating_sub(insets.vertical_sum()),
        }
    }
}

impl From<Rect> for IRect {
    fn from(rect: Rect) -> Self {
        IRect::new(
            i32::from(rect.x),
            i32::from(rect.y),
            i32::from(rect.width),
            i32::from(rect.height),
        )
    }
}

/// A layout-space rectangle with signed origin and non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    width: i32,
    height: i32,
}

impl IRect {
    /// Create a rectangle. Negative extents are stored as zero.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: if width < 0 { 0 } else { width },
            height: if height < 0 { 0 } else { height },
        }
    }

    /// Width in cells (never negative).
    #[inline]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells (never negative).
    #[inline]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Zero width or zero height.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    #[inline]
    pub const fn encloses(&self, other: &IRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection with another rectangle.
    ///
    /// Disjoint rectangles produce a zero-area rectangle anchored at the
    /// clamped origin, never a negative extent.
    pub fn intersection(&self, other: &IRect) -> IRect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        IRect::new(x, y, right - x, bottom - y)
    }

    /// Move every edge inward by the given insets.
    pub fn inner(&self, insets: Sides) -> IRect {
        IRect::new(
            self.x + i32::from(insets.left),
            self.y + i32::from(insets.top),
            self.width - i32::from(insets.horizontal_sum()),
            self.height - i32::from(insets.vertical_sum()),
        )
    }

    /// Move every edge outward by the given insets.
    pub fn outer(&self, insets: Sides) -> IRect {
        IRect::new(
            self.x - i32::from(insets.left),
            self.y - i32::from(insets.top),
            self.width + i32::from(insets.horizontal_sum()),
            self.height + i32::from(insets.vertical_sum()),
        )
    }

    /// Translate the rectangle.
    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32) -> IRect {
        IRect {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Convert to a grid rectangle, clamping into the `u16` domain.
    ///
    /// Returns `None` when the rectangle is empty or lies entirely at
    /// negative coordinates.
    pub fn to_rect(&self) -> Option<Rect> {
        let clipped = self.intersection(&IRect::new(0, 0, i32::from(u16::MAX), i32::from(u16::MAX)));
        if clipped.is_empty() {
            return None;
        }
        Some(Rect::new(
            clipped.x as u16,
            clipped.y as u16,
            clipped.width as u16,
            clipped.height as u16,
        ))
    }
}

/// Per-side insets (borders, padding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Sides {
    /// No insets.
    pub const ZERO: Self = Self::all(0);

    /// Create new sides with equal values.
    pub const fn all(val: u16) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: u16, right: u16, bottom: u16, left: u16) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub const fn horizontal_sum(&self) -> u16 {
        self.left.saturating_add(self.right)
    }

    /// Sum of top and bottom.
    #[inline]
    pub const fn vertical_sum(&self) -> u16 {
        self.top.saturating_add(self.bottom)
    }

    /// Side-wise sum (border + padding).
    pub const fn saturating_add(self, other: Sides) -> Sides {
        Sides {
            top: self.top.saturating_add(other.top),
            right: self.right.saturating_add(other.right),
            bottom: self.bottom.saturating_add(other.bottom),
            left: self.left.saturating_add(other.left),
        }
    }
}

impl From<u16> for Sides {
    fn from(val: u16) -> Self {
        Self::all(val)
    }
}

impl From<(u16, u16)> for Sides {
    fn from((vertical, horizontal): (u16, u16)) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IRect, Rect, Sides};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 3));
        assert!(!rect.contains(2, 8));
    }

    #[test]
    fn rect_intersection_no_overlap_is_empty() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(3, 3, 2, 2);
        assert_eq!(a.intersection(&b), Rect::default());
    }

    #[test]
    fn rect_inner_saturates() {
        let rect = Rect::new(0, 0, 3, 1);
        assert_eq!(rect.inner(Sides::all(1)), Rect::new(1, 1, 1, 0));
    }

    #[test]
    fn irect_negative_extent_clamps_to_zero() {
        let r = IRect::new(5, 5, -4, 3);
        assert_eq!(r.width(), 0);
        assert!(r.is_empty());
    }

    #[test]
    fn irect_disjoint_intersection_has_zero_area() {
        let a = IRect::new(0, 0, 10, 10);
        let b = IRect::new(20, -30, 5, 5);
        let i = a.intersection(&b);
        assert!(i.is_empty());
        assert!(i.width() >= 0 && i.height() >= 0);
    }

    #[test]
    fn irect_inner_outer_round_trip() {
        let r = IRect::new(4, 4, 10, 6);
        let pad = Sides::new(1, 2, 1, 2);
        assert_eq!(r.inner(pad).outer(pad), r);
    }

    #[test]
    fn irect_to_rect_clips_negative_origin() {
        let r = IRect::new(-3, -1, 10, 4);
        assert_eq!(r.to_rect(), Some(Rect::new(0, 0, 7, 3)));
        assert_eq!(IRect::new(-5, 0, 5, 5).to_rect(), None);
    }

    #[test]
    fn sides_sum() {
        let s = Sides::new(1, 2, 3, 4).saturating_add(Sides::all(1));
        assert_eq!(s, Sides::new(2, 3, 4, 5));
        assert_eq!(s.horizontal_sum(), 8);
        assert_eq!(s.vertical_sum(), 6);
    }
}
