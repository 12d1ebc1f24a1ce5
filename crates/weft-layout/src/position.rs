#![forbid(unsafe_code)]

//! Symbolic position constraints.
//!
//! A [`PositionSpec`] holds up to six [`Dim`]s: an offset from each edge of
//! the parent's content box plus a width and height. Each may be an absolute
//! cell count, a percentage with an optional integer term, `center` or
//! `shrink`.
//!
//! ```
//! use weft_layout::{Dim, PositionSpec};
//!
//! let spec = PositionSpec::new()
//!     .left("center".parse::<Dim>().unwrap())
//!     .top(0)
//!     .width("100%-2".parse::<Dim>().unwrap())
//!     .height(1);
//! assert_eq!(spec.width, Some(Dim::Percent { percent: 100.0, offset: -2 }));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Axis, ConfigReason, LayoutError};

/// One position or size term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dim {
    /// A signed cell count.
    Abs(i32),
    /// `floor(available * percent / 100) + offset`.
    Percent { percent: f32, offset: i32 },
    /// Centered in the available space (offsets only).
    Center,
    /// Sized to content (sizes only).
    Shrink,
}

impl Dim {
    /// A percentage with no integer term.
    #[inline]
    pub const fn percent(percent: f32) -> Self {
        Self::Percent { percent, offset: 0 }
    }

    #[inline]
    pub const fn is_percent(&self) -> bool {
        matches!(self, Self::Percent { .. })
    }

    /// Resolve an absolute or percentage term against `available`.
    ///
    /// The percentage term is floored first, then the offset is added.
    /// Returns `None` for `Center` and `Shrink`.
    pub fn length(&self, available: i32) -> Option<i32> {
        match *self {
            Self::Abs(n) => Some(n),
            Self::Percent { percent, offset } => {
                let base = (f64::from(available) * f64::from(percent) / 100.0).floor();
                Some((base as i32).saturating_add(offset))
            }
            Self::Center | Self::Shrink => None,
        }
    }
}

impl From<i32> for Dim {
    fn from(n: i32) -> Self {
        Self::Abs(n)
    }
}

impl From<u16> for Dim {
    fn from(n: u16) -> Self {
        Self::Abs(i32::from(n))
    }
}

impl FromStr for Dim {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LayoutError::ParseDim {
            input: s.to_string(),
        };
        let t = s.trim();
        match t {
            "center" => return Ok(Self::Center),
            "shrink" => return Ok(Self::Shrink),
            "half" => return Ok(Self::percent(50.0)),
            _ => {}
        }

        let Some((pct, rest)) = t.split_once('%') else {
            return t.parse::<i32>().map(Self::Abs).map_err(|_| err());
        };
        let percent: f32 = pct.trim().parse().map_err(|_| err())?;
        if !percent.is_finite() || percent < 0.0 {
            return Err(err());
        }
        let rest = rest.trim();
        let offset = if rest.is_empty() {
            0
        } else {
            let mut chars = rest.chars();
            let sign = chars.next();
            let digits = chars.as_str().trim();
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            let n: i32 = digits.parse().map_err(|_| err())?;
            match sign {
                Some('+') => n,
                Some('-') => -n,
                _ => return Err(err()),
            }
        };
        Ok(Self::Percent { percent, offset })
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Abs(n) => write!(f, "{n}"),
            Self::Percent { percent, offset } => {
                write!(f, "{percent}%")?;
                match offset {
                    0 => Ok(()),
                    o if o > 0 => write!(f, "+{o}"),
                    o => write!(f, "{o}"),
                }
            }
            Self::Center => f.write_str("center"),
            Self::Shrink => f.write_str("shrink"),
        }
    }
}

/// A node's declared position and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSpec {
    pub left: Option<Dim>,
    pub right: Option<Dim>,
    pub top: Option<Dim>,
    pub bottom: Option<Dim>,
    pub width: Option<Dim>,
    pub height: Option<Dim>,
}

/// The three terms of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSpec {
    pub start: Option<Dim>,
    pub end: Option<Dim>,
    pub size: Option<Dim>,
}

impl PositionSpec {
    pub const fn new() -> Self {
        Self {
            left: None,
            right: None,
            top: None,
            bottom: None,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn left(mut self, dim: impl Into<Dim>) -> Self {
        self.left = Some(dim.into());
        self
    }

    #[must_use]
    pub fn right(mut self, dim: impl Into<Dim>) -> Self {
        self.right = Some(dim.into());
        self
    }

    #[must_use]
    pub fn top(mut self, dim: impl Into<Dim>) -> Self {
        self.top = Some(dim.into());
        self
    }

    #[must_use]
    pub fn bottom(mut self, dim: impl Into<Dim>) -> Self {
        self.bottom = Some(dim.into());
        self
    }

    #[must_use]
    pub fn width(mut self, dim: impl Into<Dim>) -> Self {
        self.width = Some(dim.into());
        self
    }

    #[must_use]
    pub fn height(mut self, dim: impl Into<Dim>) -> Self {
        self.height = Some(dim.into());
        self
    }

    /// Set one key by name (`left`, `right`, `top`, `bottom`, `width`,
    /// `height`) from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LayoutError> {
        let dim: Dim = value.parse()?;
        let slot = match key {
            "left" => &mut self.left,
            "right" => &mut self.right,
            "top" => &mut self.top,
            "bottom" => &mut self.bottom,
            "width" => &mut self.width,
            "height" => &mut self.height,
            _ => {
                return Err(LayoutError::ParseDim {
                    input: format!("{key}={value}"),
                });
            }
        };
        *slot = Some(dim);
        Ok(())
    }

    pub const fn axis(&self, axis: Axis) -> AxisSpec {
        match axis {
            Axis::Horizontal => AxisSpec {
                start: self.left,
                end: self.right,
                size: self.width,
            },
            Axis::Vertical => AxisSpec {
                start: self.top,
                end: self.bottom,
                size: self.height,
            },
        }
    }

    /// Check both axes for contradictions. `shrink` is the node-level flag
    /// that shrinks every axis without a declared size.
    pub fn validate(&self, shrink: bool) -> Result<(), LayoutError> {
        self.axis(Axis::Horizontal).validate(Axis::Horizontal, shrink)?;
        self.axis(Axis::Vertical).validate(Axis::Vertical, shrink)
    }
}

impl AxisSpec {
    /// Whether the size on this axis comes from content.
    #[inline]
    pub fn shrinks(&self, shrink_flag: bool) -> bool {
        match self.size {
            Some(Dim::Shrink) => true,
            None => shrink_flag,
            Some(_) => false,
        }
    }

    pub fn validate(&self, axis: Axis, shrink_flag: bool) -> Result<(), LayoutError> {
        if matches!(self.end, Some(Dim::Center)) {
            return Err(LayoutError::config(axis, ConfigReason::CenterOnTrailingEdge));
        }
        if matches!(self.start, Some(Dim::Shrink)) || matches!(self.end, Some(Dim::Shrink)) {
            return Err(LayoutError::config(axis, ConfigReason::ShrinkAsPosition));
        }
        if matches!(self.size, Some(Dim::Center)) {
            return Err(LayoutError::config(axis, ConfigReason::CenterAsSize));
        }
        if shrink_flag && self.size.is_some_and(|d| d.is_percent()) {
            return Err(LayoutError::config(axis, ConfigReason::ShrinkWithPercentage));
        }
        if matches!(self.start, Some(Dim::Center)) && self.size.is_none() && !shrink_flag {
            return Err(LayoutError::config(axis, ConfigReason::CenterWithoutSize));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(s: &str) -> Dim {
        s.parse().expect("valid dim")
    }

    #[test]
    fn parse_forms() {
        assert_eq!(dim("10"), Dim::Abs(10));
        assert_eq!(dim("-3"), Dim::Abs(-3));
        assert_eq!(dim("50%"), Dim::percent(50.0));
        assert_eq!(dim("50%+1"), Dim::Percent { percent: 50.0, offset: 1 });
        assert_eq!(dim("100%-2"), Dim::Percent { percent: 100.0, offset: -2 });
        assert_eq!(dim("33.5%"), Dim::percent(33.5));
        assert_eq!(dim("half"), Dim::percent(50.0));
        assert_eq!(dim(" center "), Dim::Center);
        assert_eq!(dim("shrink"), Dim::Shrink);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "abc", "50%%", "50%*2", "50%+", "50%+1+2", "-5%", "1.5", "%"] {
            assert!(bad.parse::<Dim>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn display_round_trips() {
        for s in ["10", "-3", "50%", "50%+1", "100%-2", "center", "shrink"] {
            assert_eq!(dim(s).to_string(), s);
        }
    }

    #[test]
    fn percent_floors_before_offset() {
        assert_eq!(dim("50%").length(81), Some(40));
        assert_eq!(dim("100%-2").length(80), Some(78));
        assert_eq!(dim("50%+1").length(9), Some(5));
        assert_eq!(Dim::Center.length(80), None);
    }

    #[test]
    fn validation_rules() {
        let center_no_size = PositionSpec::new().left(Dim::Center);
        assert_eq!(
            center_no_size.validate(false),
            Err(LayoutError::config(Axis::Horizontal, ConfigReason::CenterWithoutSize))
        );
        assert!(center_no_size.validate(true).is_ok());

        let trailing = PositionSpec::new().bottom(Dim::Center).height(1);
        assert_eq!(
            trailing.validate(false),
            Err(LayoutError::config(Axis::Vertical, ConfigReason::CenterOnTrailingEdge))
        );

        let shrink_pct = PositionSpec::new().width(Dim::percent(50.0));
        assert_eq!(
            shrink_pct.validate(true),
            Err(LayoutError::config(Axis::Horizontal, ConfigReason::ShrinkWithPercentage))
        );
        assert!(shrink_pct.validate(false).is_ok());

        assert!(PositionSpec::new().top(Dim::Shrink).validate(false).is_err());
        assert!(PositionSpec::new().width(Dim::Center).validate(false).is_err());
    }

    #[test]
    fn set_by_key() {
        let mut spec = PositionSpec::new();
        spec.set("width", "50%+1").expect("valid");
        spec.set("left", "center").expect("valid");
        assert_eq!(spec.width, Some(Dim::Percent { percent: 50.0, offset: 1 }));
        assert_eq!(spec.left, Some(Dim::Center));
        assert!(spec.set("depth", "1").is_err());
    }
}
