#![forbid(unsafe_code)]

//! The cell grid.
//!
//! A `Buffer` is a fixed `width × height` matrix of [`Cell`]s stored in
//! row-major order (`index = y * width + x`), with a scissor stack for
//! clipping nested boxes.
//!
//! # Invariants
//!
//! 1. `cells.len() == width * height`
//! 2. A continuation cell is always preceded, in the same row, by the head of
//!    the wide grapheme that owns it. No public write path can split a pair:
//!    overwriting either half blanks the other.
//! 3. The scissor stack is never empty, and each push can only shrink it.

use weft_core::geometry::Rect;
use weft_text::graphemes;

use crate::cell::{Cell, CellContent, PackedAttr};
use crate::grapheme_pool::GraphemePool;

/// A 2D grid of terminal cells.
///
/// # Example
///
/// ```
/// use weft_render::buffer::Buffer;
/// use weft_render::cell::{Cell, PackedAttr};
/// use weft_render::grapheme_pool::GraphemePool;
///
/// let mut pool = GraphemePool::new();
/// let mut buffer = Buffer::new(10, 1);
/// let end = buffer.put_str(0, 0, "日本", PackedAttr::DEFAULT, &mut pool);
/// assert_eq!(end, 4);
/// assert!(buffer.get(1, 0).is_some_and(Cell::is_continuation));
/// ```
#[derive(Debug, Clone)]
pub struct Buffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    scissor_stack: Vec<Rect>,
}

impl Buffer {
    /// Create a blank buffer. Zero-sized buffers are allowed and hold no cells.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; size],
            scissor_stack: vec![Rect::from_size(width, height)],
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounding rect of the entire buffer.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Raw access to the cell slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_cells(&self, y: u16) -> &[Cell] {
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }

    // ========== Writing ==========

    /// Blank out the wide grapheme overlapping (x, y), if any.
    fn cleanup_overlap(&mut self, x: u16, y: u16) {
        let Some(idx) = self.index(x, y) else { return };
        let current = self.cells[idx];

        if current.width() > 1 {
            for i in 1..current.width() as u16 {
                if let Some(tail) = self.index(x.saturating_add(i), y)
                    && self.cells[tail].is_continuation()
                {
                    self.cells[tail] = Cell::blank(current.attr);
                }
            }
        } else if current.is_continuation() {
            let mut head_x = x;
            while head_x > 0 {
                head_x -= 1;
                let head_idx = idx - (x - head_x) as usize;
                let head = self.cells[head_idx];
                if head.is_continuation() {
                    continue;
                }
                let width = head.width() as u16;
                self.cells[head_idx] = Cell::blank(head.attr);
                for i in 1..width {
                    let tail_idx = head_idx + i as usize;
                    if head_x + i < self.width && self.cells[tail_idx].is_continuation() {
                        self.cells[tail_idx] = Cell::blank(head.attr);
                    }
                }
                break;
            }
        }
    }

    /// Set the cell at (x, y).
    ///
    /// - Skips cells outside the bounds or the current scissor.
    /// - A wide cell writes its continuation placeholders as well. If any of
    ///   its columns is clipped, the visible columns get blanks in the cell's
    ///   attribute instead, so a pair is never split.
    /// - Continuation cells cannot be written directly and are ignored.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if cell.is_continuation() {
            return;
        }
        let width = cell.width();
        let scissor = self.current_scissor();

        if width <= 1 {
            if !scissor.contains(x, y) {
                return;
            }
            self.cleanup_overlap(x, y);
            if let Some(idx) = self.index(x, y) {
                self.cells[idx] = cell;
            }
            return;
        }

        let fits = (0..width as u16).all(|i| {
            x.checked_add(i)
                .is_some_and(|cx| scissor.contains(cx, y))
        });
        if !fits {
            for i in 0..width as u16 {
                if let Some(cx) = x.checked_add(i)
                    && scissor.contains(cx, y)
                {
                    self.cleanup_overlap(cx, y);
                    if let Some(idx) = self.index(cx, y) {
                        self.cells[idx] = Cell::blank(cell.attr);
                    }
                }
            }
            return;
        }

        for i in 0..width as u16 {
            self.cleanup_overlap(x + i, y);
        }
        let head = y as usize * self.width as usize + x as usize;
        self.cells[head] = cell;
        for i in 1..width {
            self.cells[head + i] = Cell::continuation(cell.attr);
        }
    }

    /// Write one grapheme cluster with its head at column `x` (which may be
    /// negative or past the edge; clipped columns are simply not written).
    ///
    /// Returns the number of columns the cluster occupies. Zero-width
    /// clusters occupy nothing and are dropped.
    pub fn put_grapheme(
        &mut self,
        x: i32,
        y: i32,
        grapheme: &str,
        attr: PackedAttr,
        pool: &mut GraphemePool,
    ) -> usize {
        let width = weft_text::grapheme_width(grapheme);
        if width == 0 {
            return 0;
        }
        let Ok(row) = u16::try_from(y) else {
            return width;
        };

        let content = content_for(grapheme, width, pool);
        let on_grid = x >= 0 && x <= i32::from(u16::MAX);

        if let (Some(content), true) = (content, on_grid) {
            self.set(x as u16, row, Cell::new(content, attr));
        } else {
            // Head is off the left edge or the pool is full: every visible
            // column of the cluster becomes a blank.
            for i in 0..width as i32 {
                if let Ok(cx) = u16::try_from(x + i)
                    && self.current_scissor().contains(cx, row)
                {
                    self.cleanup_overlap(cx, row);
                    if let Some(idx) = self.index(cx, row) {
                        self.cells[idx] = Cell::blank(attr);
                    }
                }
            }
        }
        width
    }

    /// Write a string left to right starting at column `x`.
    ///
    /// Returns the column after the last written cluster. The advance equals
    /// `weft_text::display_width(text)`.
    pub fn put_str(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        attr: PackedAttr,
        pool: &mut GraphemePool,
    ) -> i32 {
        let mut cx = x;
        let limit = i32::from(self.current_scissor().right());
        for g in graphemes(text) {
            if cx >= limit {
                cx += weft_text::grapheme_width(g) as i32;
                continue;
            }
            cx += self.put_grapheme(cx, y, g, attr, pool) as i32;
        }
        cx
    }

    /// Set without scissor or pair bookkeeping. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set_raw(&mut self, x: u16, y: u16, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
        }
    }

    /// Fill a rectangle with `cell` (which should be one column wide).
    ///
    /// Respects the scissor; wide graphemes straddling the rectangle's edge
    /// are blanked.
    pub fn fill(&mut self, rect: Rect, cell: Cell) {
        debug_assert!(cell.width() <= 1, "fill with a wide cell");
        let clipped = self.current_scissor().intersection(&rect);
        if clipped.is_empty() {
            return;
        }
        for y in clipped.y..clipped.bottom() {
            self.cleanup_overlap(clipped.x, y);
            self.cleanup_overlap(clipped.right() - 1, y);
            let start = y as usize * self.width as usize;
            self.cells[start + clipped.x as usize..start + clipped.right() as usize].fill(cell);
        }
    }

    /// Reset every cell to blank and drop all scissors.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
        self.scissor_stack.truncate(1);
    }

    /// Reallocate at a new size. All content is lost.
    pub fn resize(&mut self, width: u16, height: u16) {
        *self = Buffer::new(width, height);
    }

    // ========== Scissor Stack ==========

    /// Push a clipping rectangle. The effective scissor is the intersection
    /// of everything pushed.
    pub fn push_scissor(&mut self, rect: Rect) {
        let intersected = self.current_scissor().intersection(&rect);
        self.scissor_stack.push(intersected);
    }

    /// Pop a clipping rectangle. The base scissor is never popped.
    pub fn pop_scissor(&mut self) {
        if self.scissor_stack.len() > 1 {
            self.scissor_stack.pop();
        }
    }

    #[inline]
    pub fn current_scissor(&self) -> Rect {
        self.scissor_stack.last().copied().unwrap_or_else(|| self.bounds())
    }

    #[inline]
    pub fn scissor_depth(&self) -> usize {
        self.scissor_stack.len()
    }

    // ========== Row Operations ==========

    /// Copy columns `x0..=x1` of row `y` from `src`.
    ///
    /// Both buffers must have the same width; callers guarantee the span does
    /// not split a wide pair in either buffer.
    pub fn copy_span(&mut self, src: &Buffer, y: u16, x0: u16, x1: u16) {
        debug_assert_eq!(self.width, src.width);
        if y >= self.height || y >= src.height || x0 > x1 || x1 >= self.width {
            return;
        }
        let start = y as usize * self.width as usize;
        let range = start + x0 as usize..=start + x1 as usize;
        self.cells[range.clone()].copy_from_slice(&src.cells[range]);
    }

    /// Shift rows `top..=bottom` by `shift` rows (positive moves content up)
    /// and blank the exposed rows, the way a terminal scroll region does.
    pub fn scroll_rows(&mut self, top: u16, bottom: u16, shift: i32) {
        if top > bottom || bottom >= self.height || shift == 0 {
            return;
        }
        let w = self.width as usize;
        let span_rows = (bottom - top) as usize + 1;
        let n = shift.unsigned_abs() as usize;
        let lo = top as usize * w;
        let hi = (bottom as usize + 1) * w;
        let span = &mut self.cells[lo..hi];
        if n >= span_rows {
            span.fill(Cell::BLANK);
            return;
        }
        if shift > 0 {
            span.copy_within(n * w.., 0);
            span[(span_rows - n) * w..].fill(Cell::BLANK);
        } else {
            span.copy_within(..(span_rows - n) * w, n * w);
            span[..n * w].fill(Cell::BLANK);
        }
    }

    /// Check if two buffers have identical content.
    pub fn content_eq(&self, other: &Buffer) -> bool {
        self.width == other.width && self.height == other.height && self.cells == other.cells
    }
}

/// Cell content for a cluster: inline for a single char, interned otherwise.
/// `None` when the pool has no room left.
fn content_for(grapheme: &str, width: usize, pool: &mut GraphemePool) -> Option<CellContent> {
    let mut chars = grapheme.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(CellContent::from_char(c));
    }
    pool.try_intern(grapheme, width as u8).map(CellContent::from_grapheme)
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for Buffer {}
