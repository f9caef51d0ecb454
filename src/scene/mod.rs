//! Scene data: meshes, materials and the camera

mod camera;
mod material;
mod mesh;
mod triangulate;

pub use camera::*;
pub use material::*;
pub use mesh::*;
pub use triangulate::*;
