//! CPU software rasterizer
//!
//! Features:
//! - Row-vector transform pipeline (model, view, projection, viewport)
//! - Bresenham and DDA line strategies
//! - Scanline triangle fill with a depth buffer
//! - Flat, Gouraud, per-pixel Lambert, Blinn-Phong and material-mapped
//!   shading with perspective-correct attributes

mod framebuffer;
mod line;
mod math;
mod render;
mod shading;
mod triangle;
mod types;

pub use framebuffer::*;
pub use line::*;
pub use math::*;
pub use render::*;
pub use shading::*;
pub use triangle::*;
pub use types::*;
