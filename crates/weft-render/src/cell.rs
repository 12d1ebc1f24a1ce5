#![forbid(unsafe_code)]

//! Cell types and the attribute codec.
//!
//! A [`Cell`] is a `(PackedAttr, CellContent)` pair occupying exactly
//! **16 bytes**, so "did this cell change" is two integer compares.
//!
//! # Layout (16 bytes)
//!
//! ```text
//! Cell {
//!     content: CellContent,  // 4 bytes - char, GraphemeId or CONTINUATION
//!     attr: PackedAttr,      // 8 bytes - fg, bg, style flags
//! }                          // + 4 bytes alignment padding
//! ```
//!
//! # Attribute packing
//!
//! ```text
//! bits 0..26   background  [25-24: tag][23-0: payload]
//! bits 26..52  foreground  [51-50: tag][49-26: payload]
//! bits 52..60  StyleFlags
//! ```
//!
//! Color tags: `0` default, `1` indexed (payload = palette index), `2` RGB
//! (payload = `0xRRGGBB`). The all-zero word is the terminal default
//! attribute, so a freshly cleared grid compares equal to a default one.

use weft_text::char_width;

/// Grapheme ID: reference to an interned string in
/// [`GraphemePool`](crate::grapheme_pool::GraphemePool).
///
/// ```text
/// [30-24: width (7 bits)][23-0: pool slot (24 bits)]
/// ```
///
/// The width is embedded so width queries never touch the pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct GraphemeId(u32);

impl GraphemeId {
    /// Maximum slot index (24 bits).
    pub const MAX_SLOT: u32 = 0x00FF_FFFF;

    /// Maximum width (7 bits).
    pub const MAX_WIDTH: u8 = 127;

    /// Create a new `GraphemeId` from slot index and display width.
    #[inline]
    pub const fn new(slot: u32, width: u8) -> Self {
        debug_assert!(slot <= Self::MAX_SLOT, "slot overflow");
        debug_assert!(width <= Self::MAX_WIDTH, "width overflow");
        Self((slot & Self::MAX_SLOT) | (((width & Self::MAX_WIDTH) as u32) << 24))
    }

    /// Pool slot index.
    #[inline]
    pub const fn slot(self) -> usize {
        (self.0 & Self::MAX_SLOT) as usize
    }

    /// Display width.
    #[inline]
    pub const fn width(self) -> usize {
        ((self.0 >> 24) & 0x7F) as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & 0x7FFF_FFFF)
    }
}

impl core::fmt::Debug for GraphemeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphemeId")
            .field("slot", &self.slot())
            .field("width", &self.width())
            .finish()
    }
}

/// Cell content: a direct char, a grapheme reference, or a continuation.
///
/// ```text
/// Bit 31 = 0: Unicode scalar value in bits 0-20
/// Bit 31 = 1: GraphemeId in bits 0-30
/// 0x7FFF_FFFF: CONTINUATION (outside the scalar range)
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CellContent(u32);

impl CellContent {
    /// A space.
    pub const BLANK: Self = Self(' ' as u32);

    /// Second column of a wide grapheme. Never independently readable.
    pub const CONTINUATION: Self = Self(0x7FFF_FFFF);

    const GRAPHEME_BIT: u32 = 0x8000_0000;

    #[inline]
    pub const fn from_char(c: char) -> Self {
        Self(c as u32)
    }

    #[inline]
    pub const fn from_grapheme(id: GraphemeId) -> Self {
        Self(Self::GRAPHEME_BIT | id.raw())
    }

    #[inline]
    pub const fn is_grapheme(self) -> bool {
        self.0 & Self::GRAPHEME_BIT != 0
    }

    #[inline]
    pub const fn is_continuation(self) -> bool {
        self.0 == Self::CONTINUATION.0
    }

    /// The inline character, if this is neither a grapheme nor a continuation.
    #[inline]
    pub fn as_char(self) -> Option<char> {
        if self.is_grapheme() || self.is_continuation() {
            None
        } else {
            char::from_u32(self.0)
        }
    }

    #[inline]
    pub const fn grapheme_id(self) -> Option<GraphemeId> {
        if self.is_grapheme() {
            Some(GraphemeId::from_raw(self.0))
        } else {
            None
        }
    }

    /// Columns occupied starting at this cell.
    ///
    /// Continuations are zero: their column is accounted to the head.
    #[inline]
    pub fn width(self) -> usize {
        if self.is_continuation() {
            0
        } else if let Some(id) = self.grapheme_id() {
            id.width()
        } else {
            self.as_char().map_or(1, char_width)
        }
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Default for CellContent {
    fn default() -> Self {
        Self::BLANK
    }
}

impl core::fmt::Debug for CellContent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_continuation() {
            write!(f, "CellContent::CONTINUATION")
        } else if let Some(c) = self.as_char() {
            write!(f, "CellContent::Char({c:?})")
        } else if let Some(id) = self.grapheme_id() {
            write!(f, "CellContent::Grapheme({id:?})")
        } else {
            write!(f, "CellContent(0x{:08x})", self.0)
        }
    }
}

/// Terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's own default.
    #[default]
    Default,
    /// Palette index 0-255 (0-7 basic, 8-15 bright, 16-255 extended).
    Indexed(u8),
    /// 24-bit color.
    Rgb(u8, u8, u8),
}

impl Color {
    const TAG_SHIFT: u32 = 24;
    const PAYLOAD_MASK: u64 = 0x00FF_FFFF;
    const FIELD_MASK: u64 = 0x03FF_FFFF;

    /// Encode into a 26-bit field.
    #[inline]
    pub const fn pack(self) -> u64 {
        match self {
            Color::Default => 0,
            Color::Indexed(i) => (1 << Self::TAG_SHIFT) | i as u64,
            Color::Rgb(r, g, b) => {
                (2 << Self::TAG_SHIFT) | ((r as u64) << 16) | ((g as u64) << 8) | b as u64
            }
        }
    }

    /// Decode a 26-bit field. Unknown tags decode as [`Color::Default`].
    #[inline]
    pub const fn unpack(bits: u64) -> Self {
        let bits = bits & Self::FIELD_MASK;
        let payload = bits & Self::PAYLOAD_MASK;
        match bits >> Self::TAG_SHIFT {
            1 => Color::Indexed(payload as u8),
            2 => Color::Rgb((payload >> 16) as u8, (payload >> 8) as u8, payload as u8),
            _ => Color::Default,
        }
    }
}

bitflags::bitflags! {
    /// 8-bit cell style flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity.
        const BOLD          = 0b0000_0001;
        /// Dim / decreased intensity.
        const DIM           = 0b0000_0010;
        const ITALIC        = 0b0000_0100;
        const UNDERLINE     = 0b0000_1000;
        const BLINK         = 0b0001_0000;
        /// Swap foreground and background.
        const INVERSE       = 0b0010_0000;
        /// Hidden text.
        const INVISIBLE     = 0b0100_0000;
        const STRIKETHROUGH = 0b1000_0000;
    }
}

/// Decoded cell attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr {
    pub fg: Color,
    pub bg: Color,
    pub flags: StyleFlags,
}

impl Attr {
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        flags: StyleFlags::empty(),
    };

    #[must_use]
    pub const fn fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    #[must_use]
    pub const fn bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    #[must_use]
    pub const fn flags(mut self, flags: StyleFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub const fn pack(self) -> PackedAttr {
        PackedAttr::new(self.fg, self.bg, self.flags)
    }
}

impl From<Attr> for PackedAttr {
    fn from(attr: Attr) -> Self {
        attr.pack()
    }
}

/// Foreground, background and style flags in one integer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedAttr(u64);

impl PackedAttr {
    /// Terminal default colors, no style.
    pub const DEFAULT: Self = Self(0);

    const FG_SHIFT: u32 = 26;
    const FLAGS_SHIFT: u32 = 52;

    #[inline]
    pub const fn new(fg: Color, bg: Color, flags: StyleFlags) -> Self {
        Self(bg.pack() | (fg.pack() << Self::FG_SHIFT) | ((flags.bits() as u64) << Self::FLAGS_SHIFT))
    }

    #[inline]
    pub const fn fg(self) -> Color {
        Color::unpack(self.0 >> Self::FG_SHIFT)
    }

    #[inline]
    pub const fn bg(self) -> Color {
        Color::unpack(self.0)
    }

    #[inline]
    pub const fn flags(self) -> StyleFlags {
        StyleFlags::from_bits_truncate((self.0 >> Self::FLAGS_SHIFT) as u8)
    }

    #[inline]
    pub const fn decode(self) -> Attr {
        Attr {
            fg: self.fg(),
            bg: self.bg(),
            flags: self.flags(),
        }
    }

    /// Same colors and flags with a different background.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self::new(self.fg(), bg, self.flags())
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl core::fmt::Debug for PackedAttr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let attr = self.decode();
        f.debug_struct("PackedAttr")
            .field("fg", &attr.fg)
            .field("bg", &attr.bg)
            .field("flags", &attr.flags)
            .finish()
    }
}

/// A single terminal cell (16 bytes).
///
/// # Invariants
///
/// - A continuation cell always follows the head of a wide grapheme in the
///   same row and carries the head's attribute.
/// - The default cell is a blank with the default attribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(C, align(16))]
pub struct Cell {
    pub content: CellContent,
    pub attr: PackedAttr,
}

const _: () = assert!(core::mem::size_of::<Cell>() == 16);

impl Cell {
    /// A space with the default attribute.
    pub const BLANK: Self = Self {
        content: CellContent::BLANK,
        attr: PackedAttr::DEFAULT,
    };

    #[inline]
    pub const fn new(content: CellContent, attr: PackedAttr) -> Self {
        Self { content, attr }
    }

    #[inline]
    pub const fn from_char(c: char) -> Self {
        Self::new(CellContent::from_char(c), PackedAttr::DEFAULT)
    }

    /// A space painted with `attr`.
    #[inline]
    pub const fn blank(attr: PackedAttr) -> Self {
        Self::new(CellContent::BLANK, attr)
    }

    /// Continuation placeholder owned by a head painted with `attr`.
    #[inline]
    pub const fn continuation(attr: PackedAttr) -> Self {
        Self::new(CellContent::CONTINUATION, attr)
    }

    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.content.is_continuation()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.content.width()
    }

    /// Bitwise equality (fast path for diffing).
    ///
    /// Uses `&` rather than `&&` so both compares are always evaluated.
    #[inline]
    pub fn bits_eq(&self, other: &Self) -> bool {
        (self.content.raw() == other.content.raw()) & (self.attr.raw() == other.attr.raw())
    }

    #[inline]
    #[must_use]
    pub const fn with_char(mut self, c: char) -> Self {
        self.content = CellContent::from_char(c);
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_attr(mut self, attr: PackedAttr) -> Self {
        self.attr = attr;
        self
    }
}

impl core::fmt::Debug for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cell")
            .field("content", &self.content)
            .field("attr", &self.attr)
            .finish()
    }
}
