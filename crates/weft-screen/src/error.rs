#![forbid(unsafe_code)]

use std::fmt;
use std::io;

use weft_layout::LayoutError;

use crate::node::NodeId;

/// Why a tree operation or render cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralReason {
    /// The node is not attached to the screen's root.
    Detached,
    /// The id refers to a removed node.
    StaleId,
    /// Attaching would make a node its own ancestor.
    Cycle,
    /// The root cannot be removed, detached or re-parented.
    Root,
    /// The operation needs a scrollable node.
    NotScrollable,
}

impl fmt::Display for StructuralReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Detached => "node is not attached to the screen",
            Self::StaleId => "node has been removed",
            Self::Cycle => "node would become its own ancestor",
            Self::Root => "operation not allowed on the root node",
            Self::NotScrollable => "node is not scrollable",
        };
        f.write_str(msg)
    }
}

/// Errors surfaced by [`Screen`](crate::screen::Screen).
#[derive(Debug)]
pub enum ScreenError {
    /// A node's position spec contradicts itself.
    Configuration { node: NodeId, source: LayoutError },
    /// A node is used outside a valid tree context.
    Structural {
        node: NodeId,
        reason: StructuralReason,
    },
    /// Writing to the output sink failed.
    Output(io::Error),
}

impl ScreenError {
    pub(crate) const fn structural(node: NodeId, reason: StructuralReason) -> Self {
        Self::Structural { node, reason }
    }
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { node, source } => write!(f, "node {node}: {source}"),
            Self::Structural { node, reason } => write!(f, "node {node}: {reason}"),
            Self::Output(err) => write!(f, "output failed: {err}"),
        }
    }
}

impl std::error::Error for ScreenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration { source, .. } => Some(source),
            Self::Output(err) => Some(err),
            Self::Structural { .. } => None,
        }
    }
}

impl From<io::Error> for ScreenError {
    fn from(err: io::Error) -> Self {
        Self::Output(err)
    }
}
