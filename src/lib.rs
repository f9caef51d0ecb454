//! softshade: CPU software renderer
//!
//! Turns Wavefront OBJ meshes into shaded pixels without a GPU:
//! - Row-vector transform pipeline with perspective division
//! - Ear-heuristic triangulation of n-gons at load time
//! - Bresenham and DDA line rasterization
//! - Scanline triangle fill with a depth buffer
//! - Flat, Gouraud, Phong and material-mapped Blinn-Phong shading

pub mod config;
pub mod error;
pub mod loader;
pub mod rasterizer;
pub mod scene;

pub use config::RenderConfig;
pub use error::{ConfigError, LoadError, ParseError, ParseErrorKind, PolygonError, ResourceError};
pub use loader::{load_obj, LoadedMesh};
pub use rasterizer::{DrawMode, LineStrategy, Renderer};
pub use scene::{Camera, Mesh};
