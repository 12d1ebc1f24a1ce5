#![forbid(unsafe_code)]

use std::fmt;

/// Layout axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Why a position spec cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigReason {
    /// Shrink sizing combined with a percentage size.
    ShrinkWithPercentage,
    /// `center` with no size to center.
    CenterWithoutSize,
    /// `center` on `right` or `bottom`.
    CenterOnTrailingEdge,
    /// `shrink` used as an offset.
    ShrinkAsPosition,
    /// `center` used as a size.
    CenterAsSize,
}

impl fmt::Display for ConfigReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ShrinkWithPercentage => "shrink and a percentage size are mutually exclusive",
            Self::CenterWithoutSize => "center requires a size on the same axis",
            Self::CenterOnTrailingEdge => "center is only valid for left or top",
            Self::ShrinkAsPosition => "shrink is only valid for width or height",
            Self::CenterAsSize => "center is not a valid size",
        };
        f.write_str(msg)
    }
}

/// Errors raised while parsing or resolving position specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The spec contradicts itself on one axis.
    Configuration { axis: Axis, reason: ConfigReason },
    /// A position string could not be parsed.
    ParseDim { input: String },
}

impl LayoutError {
    pub(crate) const fn config(axis: Axis, reason: ConfigReason) -> Self {
        Self::Configuration { axis, reason }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { axis, reason } => {
                write!(f, "invalid {axis} position: {reason}")
            }
            Self::ParseDim { input } => write!(f, "cannot parse position value {input:?}"),
        }
    }
}

impl std::error::Error for LayoutError {}
