#![forbid(unsafe_code)]

//! Core: geometry shared by layout, rendering and the screen compositor.

pub mod geometry;

pub use geometry::{IRect, Rect, Sides};
