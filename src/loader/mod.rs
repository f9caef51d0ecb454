//! Mesh, material and texture loading

mod image;
mod mtl;
mod obj;

pub use self::image::*;
pub use mtl::*;
pub use obj::*;
