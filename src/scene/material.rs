//! Materials and their texel maps

use crate::rasterizer::Vec3;

/// Immutable grid of normalized RGB texels.
///
/// Row 0 is the bottom of the image, so `v = 0` samples the bottom edge
/// the way OBJ texture coordinates expect.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSampler {
    width: usize,
    height: usize,
    texels: Vec<Vec3>,
}

impl MaterialSampler {
    /// Build from bottom-up rows. Returns `None` if the texel count does
    /// not match the dimensions or either dimension is zero.
    pub fn new(width: usize, height: usize, texels: Vec<Vec3>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != width * height {
            return None;
        }
        Some(Self { width, height, texels })
    }

    /// One-texel sampler, handy as a uniform map
    pub fn solid(color: Vec3) -> Self {
        Self { width: 1, height: 1, texels: vec![color] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Nearest-neighbor lookup, `u`/`v` clamped to [0, 1]
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let u = if u.is_nan() { 0.0 } else { u.clamp(0.0, 1.0) };
        let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let x = (u * (self.width - 1) as f32).round() as usize;
        let y = (v * (self.height - 1) as f32).round() as usize;
        self.texels[y * self.width + x]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub name: String,
    /// `map_Kd`
    pub diffuse: Option<MaterialSampler>,
    /// `norm`
    pub normal: Option<MaterialSampler>,
    /// `map_Ks`
    pub specular: Option<MaterialSampler>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn diffuse_at(&self, u: f32, v: f32) -> Option<Vec3> {
        self.diffuse.as_ref().map(|map| map.sample(u, v))
    }

    /// Object-space normal decoded from `[0, 1]` texels to `[-1, 1]`
    pub fn normal_at(&self, u: f32, v: f32) -> Option<Vec3> {
        self.normal
            .as_ref()
            .map(|map| (map.sample(u, v) * 2.0 - Vec3::ONE).normalize())
    }

    /// Specular strength from the blue channel
    pub fn specular_at(&self, u: f32, v: f32) -> Option<f32> {
        self.specular.as_ref().map(|map| map.sample(u, v).z)
    }
}
