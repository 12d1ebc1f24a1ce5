#![forbid(unsafe_code)]

//! ANSI/VT escape sequences and the bundled capability provider.
//!
//! The free functions are pure byte generators. [`AnsiCapabilities`] wires
//! them into the [`TerminalCapabilities`] trait for any xterm-compatible
//! terminal.
//!
//! # Sequence Reference
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ n ; ... m` | SGR (Select Graphic Rendition) |
//! | CSI | `ESC [ row ; col H` | CUP (Cursor Position, 1-indexed) |
//! | CSI | `ESC [ top ; bottom r` | DECSTBM (Set Scroll Region) |
//! | CSI | `ESC [ n S` | SU (Scroll Up) |
//! | CSI | `ESC [ n T` | SD (Scroll Down) |

use std::io::{self, Write};

use crate::cell::{Attr, Color, StyleFlags};
use crate::sink::TerminalCapabilities;

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// Reset scroll region to full screen: `CSI r`
pub const RESET_SCROLL_REGION: &[u8] = b"\x1b[r";

/// SGR on-codes for each style flag, in emission order.
pub const FLAG_TABLE: [(StyleFlags, u8); 8] = [
    (StyleFlags::BOLD, 1),
    (StyleFlags::DIM, 2),
    (StyleFlags::ITALIC, 3),
    (StyleFlags::UNDERLINE, 4),
    (StyleFlags::BLINK, 5),
    (StyleFlags::INVERSE, 7),
    (StyleFlags::INVISIBLE, 8),
    (StyleFlags::STRIKETHROUGH, 9),
];

/// CUP (Cursor Position): `CSI row ; col H`
///
/// Row and col are 0-indexed input, converted to 1-indexed for ANSI.
pub fn cup<W: Write + ?Sized>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row.saturating_add(1), col.saturating_add(1))
}

/// DECSTBM (Set Top and Bottom Margins): `CSI top ; bottom r`
///
/// Top and bottom are 0-indexed and inclusive.
pub fn set_scroll_region<W: Write + ?Sized>(w: &mut W, top: u16, bottom: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}r", top.saturating_add(1), bottom.saturating_add(1))
}

#[inline]
pub fn reset_scroll_region<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.write_all(RESET_SCROLL_REGION)
}

/// SU: `CSI n S`
pub fn scroll_up<W: Write + ?Sized>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}S")
}

/// SD: `CSI n T`
pub fn scroll_down<W: Write + ?Sized>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}T")
}

#[inline]
pub fn sgr_reset<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// Map a 24-bit color to the nearest entry of the 6×6×6 cube or gray ramp.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((u16::from(r) - 8) * 24 / 247) as u8;
    }
    let level = |c: u8| -> u8 {
        if c < 48 {
            0
        } else if c < 115 {
            1
        } else {
            ((u16::from(c) - 35) / 40) as u8
        }
    };
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Push SGR parameters for a color. `base` is 30 (fg) or 40 (bg).
fn push_color(params: &mut String, color: Color, base: u8, truecolor: bool) {
    use std::fmt::Write as _;
    let sep = if params.is_empty() { "" } else { ";" };
    // Writing into a String cannot fail.
    let _ = match color {
        Color::Default => write!(params, "{sep}{}", base + 9),
        Color::Indexed(i) if i < 8 => write!(params, "{sep}{}", base + i),
        Color::Indexed(i) if i < 16 => write!(params, "{sep}{}", base + 60 + i - 8),
        Color::Indexed(i) => write!(params, "{sep}{};5;{i}", base + 8),
        Color::Rgb(r, g, b) if truecolor => write!(params, "{sep}{};2;{r};{g};{b}", base + 8),
        Color::Rgb(r, g, b) => write!(params, "{sep}{};5;{}", base + 8, rgb_to_256(r, g, b)),
    };
}

/// Full attribute as one SGR: reset, flags, then colors.
///
/// Default colors are implied by the reset and not repeated.
pub fn sgr_attr<W: Write + ?Sized>(w: &mut W, attr: Attr, truecolor: bool) -> io::Result<()> {
    let mut params = String::from("0");
    for (flag, code) in FLAG_TABLE {
        if attr.flags.contains(flag) {
            params.push(';');
            params.push_str(&code.to_string());
        }
    }
    if attr.fg != Color::Default {
        push_color(&mut params, attr.fg, 30, truecolor);
    }
    if attr.bg != Color::Default {
        push_color(&mut params, attr.bg, 40, truecolor);
    }
    write!(w, "\x1b[{params}m")
}

/// Capability provider for xterm-compatible terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnsiCapabilities {
    /// Emit 24-bit colors directly; otherwise map to the 256-color palette.
    pub truecolor: bool,
    /// Terminal honours DECSTBM + SU/SD.
    pub scroll_region: bool,
}

impl Default for AnsiCapabilities {
    fn default() -> Self {
        Self {
            truecolor: true,
            scroll_region: true,
        }
    }
}

impl AnsiCapabilities {
    /// Detect from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Detect using a custom environment lookup.
    ///
    /// `COLORTERM=truecolor|24bit` enables 24-bit color; `TERM=dumb` or
    /// `TERM=linux` disables scroll regions.
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let colorterm = get_env("COLORTERM").unwrap_or_default().to_ascii_lowercase();
        let term = get_env("TERM").unwrap_or_default().to_ascii_lowercase();
        Self {
            truecolor: colorterm == "truecolor" || colorterm == "24bit",
            scroll_region: !matches!(term.as_str(), "dumb" | "linux"),
        }
    }
}

impl TerminalCapabilities for AnsiCapabilities {
    fn move_cursor(&self, w: &mut dyn Write, x: u16, y: u16) -> io::Result<()> {
        cup(w, y, x)
    }

    fn set_attr(&self, w: &mut dyn Write, attr: Attr) -> io::Result<()> {
        if attr == Attr::DEFAULT {
            return sgr_reset(w);
        }
        sgr_attr(w, attr, self.truecolor)
    }

    fn set_scroll_region(&self, w: &mut dyn Write, top: u16, bottom: u16) -> io::Result<()> {
        set_scroll_region(w, top, bottom)
    }

    fn reset_scroll_region(&self, w: &mut dyn Write) -> io::Result<()> {
        reset_scroll_region(w)
    }

    fn scroll_up(&self, w: &mut dyn Write, n: u16) -> io::Result<()> {
        scroll_up(w, n)
    }

    fn scroll_down(&self, w: &mut dyn Write, n: u16) -> io::Result<()> {
        scroll_down(w, n)
    }

    fn supports_scroll_region(&self) -> bool {
        self.scroll_region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn cup_is_one_indexed() {
        assert_eq!(to_string(|w| cup(w, 0, 0)), "\x1b[1;1H");
        assert_eq!(to_string(|w| cup(w, 4, 9)), "\x1b[5;10H");
    }

    #[test]
    fn scroll_sequences() {
        assert_eq!(to_string(|w| set_scroll_region(w, 2, 10)), "\x1b[3;11r");
        assert_eq!(to_string(|w| scroll_up(w, 3)), "\x1b[3S");
        assert_eq!(to_string(|w| scroll_down(w, 1)), "\x1b[1T");
        assert_eq!(to_string(|w| scroll_up(w, 0)), "");
    }

    #[test]
    fn sgr_palette_ranges() {
        let attr = Attr::DEFAULT.fg(Color::Indexed(1)).bg(Color::Indexed(12));
        assert_eq!(to_string(|w| sgr_attr(w, attr, true)), "\x1b[0;31;104m");
        let attr = Attr::DEFAULT.fg(Color::Indexed(200));
        assert_eq!(to_string(|w| sgr_attr(w, attr, true)), "\x1b[0;38;5;200m");
    }

    #[test]
    fn sgr_flags_and_truecolor() {
        let attr = Attr::DEFAULT
            .fg(Color::Rgb(1, 2, 3))
            .flags(StyleFlags::BOLD | StyleFlags::UNDERLINE);
        assert_eq!(to_string(|w| sgr_attr(w, attr, true)), "\x1b[0;1;4;38;2;1;2;3m");
        let mapped = to_string(|w| sgr_attr(w, attr, false));
        assert!(mapped.starts_with("\x1b[0;1;4;38;5;"), "{mapped:?}");
    }

    #[test]
    fn rgb_cube_mapping() {
        assert_eq!(rgb_to_256(0, 0, 0), 16);
        assert_eq!(rgb_to_256(255, 255, 255), 231);
        assert_eq!(rgb_to_256(255, 0, 0), 196);
        assert_eq!(rgb_to_256(0, 0, 255), 21);
    }

    #[test]
    fn env_detection() {
        let caps = AnsiCapabilities::from_env_with(|k| match k {
            "COLORTERM" => Some("truecolor".into()),
            "TERM" => Some("xterm-256color".into()),
            _ => None,
        });
        assert!(caps.truecolor);
        assert!(caps.scroll_region);

        let dumb = AnsiCapabilities::from_env_with(|k| (k == "TERM").then(|| "dumb".into()));
        assert!(!dumb.truecolor);
        assert!(!dumb.scroll_region);
    }
}
