#![forbid(unsafe_code)]

//! Node tree, compositor and screen context.
//!
//! - [`node`]: the node arena ([`Tree`]) with paint-order children
//! - [`style`]: shared [`NodeStyle`] values and border glyphs
//! - [`compositor`]: the pre-order paint walk
//! - [`screen`]: [`Screen`], one isolated terminal session
//! - [`config`]: [`ScreenConfig`] and its environment overrides
//!
//! # Example
//!
//! ```
//! use weft_screen::{Border, NodeKind, NodeStyle, PositionSpec, Screen, ScreenConfig};
//!
//! let mut screen = Screen::new(12, 3, ScreenConfig::default());
//! let root = screen.root();
//! let panel = screen.tree_mut().create(NodeKind::Box);
//! screen.tree_mut().append(root, panel).unwrap();
//! screen.set_position(panel, PositionSpec::new().left(0).top(0).width(8).height(3)).unwrap();
//! screen.set_style(panel, NodeStyle::new().border(Border::light())).unwrap();
//! screen.set_content(panel, "hello").unwrap();
//!
//! let diff = screen.render().unwrap();
//! assert_eq!(diff.regions().len(), 3);
//! assert_eq!(screen.hit_test(2, 1), Some(panel));
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod node;
pub mod screen;
pub mod style;

pub use compositor::{Composition, compose};
pub use config::ScreenConfig;
pub use error::{ScreenError, StructuralReason};
pub use node::{Node, NodeFlags, NodeId, NodeKind, Tree};
pub use screen::{MAX_FLUSH_PASSES, RenderHandle, Screen};
pub use style::{Border, BorderKind, BorderSet, Borders, NodeStyle, merge_light};

pub use weft_layout::{Dim, PositionSpec, ResolvedBox};
