//! InkDesk Render Library
//!
//! Render targets for the whiteboard surface.
//! The default implementation records strokes into a Vello scene.

mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use renderer::{RendererError, SurfaceConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::VelloSurface;
