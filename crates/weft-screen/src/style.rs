#![forbid(unsafe_code)]

//! Node styles and border glyphs.
//!
//! A [`NodeStyle`] is immutable once built and shared between nodes through
//! an `Arc`; changing a node's look means installing a different style.

use std::sync::{Arc, OnceLock};

use weft_core::Sides;
use weft_layout::Edges;
use weft_render::cell::{Attr, PackedAttr};
use weft_text::{Align, VAlign};

bitflags::bitflags! {
    /// Which sides of a box carry a border.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Borders: u8 {
        const TOP    = 0b0001;
        const RIGHT  = 0b0010;
        const BOTTOM = 0b0100;
        const LEFT   = 0b1000;
        const ALL    = Self::TOP.bits() | Self::RIGHT.bits() | Self::BOTTOM.bits() | Self::LEFT.bits();
    }
}

impl Borders {
    /// One cell per bordered side.
    pub const fn insets(self) -> Sides {
        Sides::new(
            self.contains(Self::TOP) as u16,
            self.contains(Self::RIGHT) as u16,
            self.contains(Self::BOTTOM) as u16,
            self.contains(Self::LEFT) as u16,
        )
    }

    pub const fn edges(self) -> Edges {
        Edges {
            top: self.contains(Self::TOP),
            right: self.contains(Self::RIGHT),
            bottom: self.contains(Self::BOTTOM),
            left: self.contains(Self::LEFT),
        }
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderKind {
    /// `┌─┐` single light lines.
    #[default]
    Light,
    /// `┏━┓` heavy lines.
    Heavy,
    /// `╔═╗` double lines.
    Double,
    /// `╭─╮` light lines with rounded corners.
    Rounded,
    /// Blank cells painted in the border attribute.
    Bg,
    /// Every border cell uses one character.
    Char(char),
}

/// Glyphs for one border kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderSet {
    pub horizontal: char,
    pub vertical: char,
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
}

impl BorderSet {
    pub const LIGHT: Self = Self {
        horizontal: '─',
        vertical: '│',
        top_left: '┌',
        top_right: '┐',
        bottom_left: '└',
        bottom_right: '┘',
    };

    pub const HEAVY: Self = Self {
        horizontal: '━',
        vertical: '┃',
        top_left: '┏',
        top_right: '┓',
        bottom_left: '┗',
        bottom_right: '┛',
    };

    pub const DOUBLE: Self = Self {
        horizontal: '═',
        vertical: '║',
        top_left: '╔',
        top_right: '╗',
        bottom_left: '╚',
        bottom_right: '╝',
    };

    pub const ROUNDED: Self = Self {
        horizontal: '─',
        vertical: '│',
        top_left: '╭',
        top_right: '╮',
        bottom_left: '╰',
        bottom_right: '╯',
    };

    pub const fn uniform(c: char) -> Self {
        Self {
            horizontal: c,
            vertical: c,
            top_left: c,
            top_right: c,
            bottom_left: c,
            bottom_right: c,
        }
    }
}

impl BorderKind {
    pub const fn border_set(self) -> BorderSet {
        match self {
            Self::Light => BorderSet::LIGHT,
            Self::Heavy => BorderSet::HEAVY,
            Self::Double => BorderSet::DOUBLE,
            Self::Rounded => BorderSet::ROUNDED,
            Self::Bg => BorderSet::uniform(' '),
            Self::Char(c) => BorderSet::uniform(c),
        }
    }
}

/// A node border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Border {
    pub kind: BorderKind,
    pub attr: Attr,
    pub sides: Borders,
}

impl Border {
    /// Light border on every side.
    pub const fn light() -> Self {
        Self {
            kind: BorderKind::Light,
            attr: Attr::DEFAULT,
            sides: Borders::ALL,
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: BorderKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }

    #[must_use]
    pub const fn sides(mut self, sides: Borders) -> Self {
        self.sides = sides;
        self
    }
}

/// Visual style of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeStyle {
    /// Attribute for content and background fill.
    pub attr: Attr,
    pub border: Option<Border>,
    pub padding: Sides,
    pub align: Align,
    pub valign: VAlign,
    /// Word-wrap content to the content box width.
    pub wrap: bool,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            attr: Attr::DEFAULT,
            border: None,
            padding: Sides::ZERO,
            align: Align::Left,
            valign: VAlign::Top,
            wrap: true,
        }
    }
}

impl NodeStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default style.
    pub fn shared_default() -> Arc<Self> {
        static DEFAULT: OnceLock<Arc<NodeStyle>> = OnceLock::new();
        DEFAULT.get_or_init(|| Arc::new(NodeStyle::default())).clone()
    }

    #[must_use]
    pub fn attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }

    #[must_use]
    pub fn border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }

    #[must_use]
    pub fn padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    #[must_use]
    pub fn wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Sides carrying a border line.
    pub fn borders(&self) -> Borders {
        self.border.map_or(Borders::empty(), |b| b.sides)
    }

    /// Border plus padding.
    pub fn insets(&self) -> Sides {
        self.borders().insets().saturating_add(self.padding)
    }

    #[inline]
    pub fn packed_attr(&self) -> PackedAttr {
        self.attr.pack()
    }
}

// Light-line junctions, indexed by arm bits (up=1, right=2, down=4, left=8).
const LIGHT_JUNCTIONS: [char; 16] = [
    ' ', '╵', '╶', '└', '╷', '│', '┌', '├', '╴', '┘', '─', '┴', '┐', '┤', '┬', '┼',
];

fn light_arms(c: char) -> Option<u8> {
    match c {
        '─' => Some(0b1010),
        '│' => Some(0b0101),
        '┌' | '╭' => Some(0b0110),
        '┐' | '╮' => Some(0b1100),
        '└' | '╰' => Some(0b0011),
        '┘' | '╯' => Some(0b1001),
        '├' => Some(0b0111),
        '┤' => Some(0b1101),
        '┬' => Some(0b1110),
        '┴' => Some(0b1011),
        '┼' => Some(0b1111),
        _ => None,
    }
}

/// Merge a light-line glyph onto an existing one, producing the junction
/// that carries the arms of both. `None` if either is not a light line.
pub fn merge_light(existing: char, incoming: char) -> Option<char> {
    let arms = light_arms(existing)? | light_arms(incoming)?;
    Some(LIGHT_JUNCTIONS[arms as usize])
}
