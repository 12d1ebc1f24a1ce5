#![forbid(unsafe_code)]

//! Position resolution for the compositor.
//!
//! - [`position`]: symbolic [`PositionSpec`] terms and their string forms
//! - [`resolve`]: the top-down [`PositionResolver`]
//! - [`dock`]: merging touching borders onto one line
//!
//! # Example
//!
//! ```
//! use weft_layout::{Dim, DockScope, NoContent, NodeGeometry, ParentBox, PositionResolver, PositionSpec};
//!
//! let spec = PositionSpec::new().top(0).left(Dim::Center).width(10).height(1);
//! let resolved = PositionResolver::new()
//!     .resolve(&spec, &NodeGeometry::default(), &ParentBox::root(80, 24), &DockScope::EMPTY, &NoContent)
//!     .unwrap();
//! assert_eq!(resolved.rel_left, 35);
//! ```

pub mod dock;
pub mod error;
pub mod position;
pub mod resolve;

pub use dock::{DockNeighbor, DockScope, Edges, dock};
pub use error::{Axis, ConfigReason, LayoutError};
pub use position::{AxisSpec, Dim, PositionSpec};
pub use resolve::{
    ClippedEdges, ContentMeasure, NoContent, NodeGeometry, ParentBox, PositionResolver, ResolvedBox,
};
pub use weft_core::{IRect, Rect, Sides};
