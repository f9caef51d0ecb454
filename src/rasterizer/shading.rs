//! Per-pixel shading evaluators
//!
//! Each shader declares its own [`Varying`] type: exactly the attributes
//! the fill loop has to interpolate for that mode, nothing more.

use std::ops::{Add, Mul, Sub};

use super::math::{Mat4, Vec3};
use super::types::Lighting;
use crate::scene::Material;

/// An attribute bundle that can be linearly interpolated
pub trait Varying: Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Varying for T where T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T> {}

/// Turns interpolated attributes into a normalized color
pub trait PixelShader {
    type Varying: Varying;

    fn shade(&self, varying: Self::Varying) -> Vec3;
}

/// Empty attribute set for modes that only need depth
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoVarying;

impl Add for NoVarying {
    type Output = NoVarying;
    fn add(self, _: NoVarying) -> NoVarying {
        NoVarying
    }
}

impl Sub for NoVarying {
    type Output = NoVarying;
    fn sub(self, _: NoVarying) -> NoVarying {
        NoVarying
    }
}

impl Mul<f32> for NoVarying {
    type Output = NoVarying;
    fn mul(self, _: f32) -> NoVarying {
        NoVarying
    }
}

/// Normal and world position at a surface point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfacePoint {
    pub normal: Vec3,
    pub world: Vec3,
}

impl Add for SurfacePoint {
    type Output = SurfacePoint;
    fn add(self, o: SurfacePoint) -> SurfacePoint {
        SurfacePoint { normal: self.normal + o.normal, world: self.world + o.world }
    }
}

impl Sub for SurfacePoint {
    type Output = SurfacePoint;
    fn sub(self, o: SurfacePoint) -> SurfacePoint {
        SurfacePoint { normal: self.normal - o.normal, world: self.world - o.world }
    }
}

impl Mul<f32> for SurfacePoint {
    type Output = SurfacePoint;
    fn mul(self, s: f32) -> SurfacePoint {
        SurfacePoint { normal: self.normal * s, world: self.world * s }
    }
}

/// Surface attributes pre-divided by clip-space w, plus 1/w itself.
///
/// These interpolate linearly in screen space; [`TexturedPoint::resolve`]
/// divides the reciprocal back out to get perspective-correct values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TexturedPoint {
    pub normal: Vec3,
    pub world: Vec3,
    pub uv: Vec3,
    pub inv_w: f32,
}

impl TexturedPoint {
    pub fn new(normal: Vec3, world: Vec3, uv: Vec3, inv_w: f32) -> Self {
        Self {
            normal: normal * inv_w,
            world: world * inv_w,
            uv: uv * inv_w,
            inv_w,
        }
    }

    /// Recover (normal, world, uv)
    pub fn resolve(self) -> (Vec3, Vec3, Vec3) {
        if self.inv_w == 0.0 {
            return (self.normal, self.world, self.uv);
        }
        let w = 1.0 / self.inv_w;
        (self.normal * w, self.world * w, self.uv * w)
    }
}

impl Add for TexturedPoint {
    type Output = TexturedPoint;
    fn add(self, o: TexturedPoint) -> TexturedPoint {
        TexturedPoint {
            normal: self.normal + o.normal,
            world: self.world + o.world,
            uv: self.uv + o.uv,
            inv_w: self.inv_w + o.inv_w,
        }
    }
}

impl Sub for TexturedPoint {
    type Output = TexturedPoint;
    fn sub(self, o: TexturedPoint) -> TexturedPoint {
        TexturedPoint {
            normal: self.normal - o.normal,
            world: self.world - o.world,
            uv: self.uv - o.uv,
            inv_w: self.inv_w - o.inv_w,
        }
    }
}

impl Mul<f32> for TexturedPoint {
    type Output = TexturedPoint;
    fn mul(self, s: f32) -> TexturedPoint {
        TexturedPoint {
            normal: self.normal * s,
            world: self.world * s,
            uv: self.uv * s,
            inv_w: self.inv_w * s,
        }
    }
}

/// Point light plus viewer position for one frame
#[derive(Debug, Clone, Copy)]
pub struct LightRig {
    pub position: Vec3,
    pub color: Vec3,
    pub eye: Vec3,
}

impl LightRig {
    /// Unit vector from `world` towards the light
    pub fn direction(&self, world: Vec3) -> Vec3 {
        (self.position - world).normalize()
    }

    /// Lambert: max(l·n, 0) · light color · surface color
    pub fn lambert(&self, normal: Vec3, world: Vec3, surface: Vec3) -> Vec3 {
        let intensity = self.direction(world).dot(normal.normalize()).max(0.0);
        self.color.mul_elem(surface) * intensity
    }
}

/// Material-dependent inputs to Blinn-Phong
#[derive(Debug, Clone, Copy)]
pub struct SurfaceSample {
    pub normal: Vec3,
    pub diffuse_color: Vec3,
    pub specular_factor: f32,
}

/// ambient + diffuse + specular, clamped per channel
pub fn blinn_phong(lighting: &Lighting, rig: &LightRig, world: Vec3, surface: SurfaceSample) -> Vec3 {
    let n = surface.normal.normalize();
    let l = rig.direction(world);
    let v = (rig.eye - world).normalize();

    let ambient = lighting.ambient_color * lighting.k_ambient;
    let n_dot_l = n.dot(l);
    let diffuse = surface.diffuse_color * (lighting.k_diffuse * n_dot_l.max(0.0));
    // No highlight on the side facing away from the light
    let spec = if n_dot_l > 0.0 {
        (-l).reflect(n).dot(v).max(0.0).powf(lighting.shininess)
    } else {
        0.0
    };
    let specular = lighting.specular_color * (lighting.k_specular * surface.specular_factor * spec);

    (ambient + diffuse + specular).clamp01()
}

pub struct FlatShader {
    pub color: Vec3,
}

impl PixelShader for FlatShader {
    type Varying = NoVarying;

    fn shade(&self, _: NoVarying) -> Vec3 {
        self.color
    }
}

/// Interpolates colors lit at the vertices
pub struct GouraudShader;

impl PixelShader for GouraudShader {
    type Varying = Vec3;

    fn shade(&self, color: Vec3) -> Vec3 {
        color
    }
}

/// Lambert relit at every pixel from the interpolated normal
pub struct PhongShadingShader<'a> {
    pub rig: &'a LightRig,
    pub surface: Vec3,
}

impl PixelShader for PhongShadingShader<'_> {
    type Varying = SurfacePoint;

    fn shade(&self, p: SurfacePoint) -> Vec3 {
        self.rig.lambert(p.normal, p.world, self.surface)
    }
}

/// Blinn-Phong with uniform material coefficients
pub struct PhongLightingShader<'a> {
    pub lighting: &'a Lighting,
    pub rig: &'a LightRig,
}

impl PixelShader for PhongLightingShader<'_> {
    type Varying = SurfacePoint;

    fn shade(&self, p: SurfacePoint) -> Vec3 {
        let surface = SurfaceSample {
            normal: p.normal,
            diffuse_color: self.lighting.diffuse_color,
            specular_factor: 1.0,
        };
        blinn_phong(self.lighting, self.rig, p.world, surface)
    }
}

/// Blinn-Phong fed by the material's maps where present
pub struct TexturedShader<'a> {
    pub lighting: &'a Lighting,
    pub rig: &'a LightRig,
    pub material: Option<&'a Material>,
    /// Model transform, applied to normals read from a normal map
    pub model: &'a Mat4,
}

impl TexturedShader<'_> {
    fn sample(&self, normal: Vec3, uv: Vec3) -> SurfaceSample {
        let Some(material) = self.material else {
            return SurfaceSample {
                normal,
                diffuse_color: self.lighting.diffuse_color,
                specular_factor: 1.0,
            };
        };
        let (u, v) = (uv.x, uv.y);
        SurfaceSample {
            normal: material
                .normal_at(u, v)
                .map(|n| n.to_direction().transform(self.model).xyz())
                .unwrap_or(normal),
            diffuse_color: material.diffuse_at(u, v).unwrap_or(self.lighting.diffuse_color),
            specular_factor: material.specular_at(u, v).unwrap_or(1.0),
        }
    }
}

impl PixelShader for TexturedShader<'_> {
    type Varying = TexturedPoint;

    fn shade(&self, p: TexturedPoint) -> Vec3 {
        let (normal, world, uv) = p.resolve();
        blinn_phong(self.lighting, self.rig, world, self.sample(normal, uv))
    }
}
