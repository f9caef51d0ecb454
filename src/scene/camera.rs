//! Orbit camera
//!
//! The eye sits on a sphere around `target`: `radius` away, `azimuth`
//! around the Y axis and `elevation` measured down from +Y (so pi/2 is
//! level with the target).

use serde::{Deserialize, Serialize};
use crate::rasterizer::{Mat4, Vec3};

/// Serializable starting state, also what [`Camera::reset`] returns to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    pub azimuth_degrees: f32,
    pub elevation_degrees: f32,
    pub target: Vec3,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            distance: 5.0,
            azimuth_degrees: 0.0,
            elevation_degrees: 90.0,
            target: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Vec3,
    radius: f32,
    azimuth: f32,
    elevation: f32,
    fov: f32,
    near: f32,
    far: f32,
    width: usize,
    height: usize,
    zoom_step: f32,
    settings: CameraSettings,
}

impl Camera {
    pub const MIN_NEAR: f32 = 0.01;
    pub const MIN_RADIUS: f32 = 0.01;
    pub const MIN_FOV: f32 = 1.0;
    pub const MAX_FOV: f32 = 179.0;
    pub const DEFAULT_ZOOM_STEP: f32 = 0.25;
    const ELEVATION_LIMIT: f32 = 0.001;

    pub fn new(settings: CameraSettings, width: usize, height: usize) -> Self {
        let mut camera = Self {
            target: settings.target,
            radius: 0.0,
            azimuth: 0.0,
            elevation: 0.0,
            fov: 0.0,
            near: 0.0,
            far: 0.0,
            width,
            height,
            zoom_step: Self::DEFAULT_ZOOM_STEP,
            settings,
        };
        camera.reset();
        camera
    }

    /// Restore the settings the camera was created with
    pub fn reset(&mut self) {
        let s = self.settings;
        self.target = s.target;
        self.radius = s.distance.max(Self::MIN_RADIUS);
        self.azimuth = s.azimuth_degrees.to_radians();
        self.elevation = Self::clamp_elevation(s.elevation_degrees.to_radians());
        self.fov = Self::clamp_fov(s.fov_degrees).to_radians();
        self.far = s.far.max(Self::MIN_NEAR * 2.0);
        self.near = self.clamp_near(s.near);
        self.zoom_step = Self::DEFAULT_ZOOM_STEP;
    }

    fn clamp_fov(degrees: f32) -> f32 {
        degrees.clamp(Self::MIN_FOV, Self::MAX_FOV)
    }

    fn clamp_elevation(radians: f32) -> f32 {
        radians.clamp(Self::ELEVATION_LIMIT, std::f32::consts::PI - Self::ELEVATION_LIMIT)
    }

    fn clamp_near(&self, near: f32) -> f32 {
        near.max(Self::MIN_NEAR).min(self.far - Self::MIN_NEAR)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn azimuth_degrees(&self) -> f32 {
        self.azimuth.to_degrees()
    }

    pub fn elevation_degrees(&self) -> f32 {
        self.elevation.to_degrees()
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    /// Eye position in world space
    pub fn position(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target
            + Vec3::new(
                self.radius * sin_el * sin_az,
                self.radius * cos_el,
                self.radius * sin_el * cos_az,
            )
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn zoom_in(&mut self) {
        self.radius = (self.radius - self.zoom_step).max(Self::MIN_RADIUS);
    }

    pub fn zoom_out(&mut self) {
        self.radius += self.zoom_step;
    }

    /// Scale the zoom step up or down by a factor of two
    pub fn change_zoom_step(&mut self, increase: bool) {
        if increase {
            self.zoom_step *= 2.0;
        } else {
            self.zoom_step = (self.zoom_step / 2.0).max(Self::MIN_RADIUS);
        }
    }

    /// Move along the sphere, angles in radians
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(std::f32::consts::TAU);
        self.elevation = Self::clamp_elevation(self.elevation + d_elevation);
    }

    pub fn change_fov(&mut self, delta_degrees: f32) {
        self.fov = Self::clamp_fov(self.fov.to_degrees() + delta_degrees).to_radians();
    }

    pub fn change_near(&mut self, delta: f32) {
        self.near = self.clamp_near(self.near + delta);
    }

    /// The far plane always stays beyond the near plane
    pub fn change_far(&mut self, delta: f32) {
        self.far = (self.far + delta).max(self.near + Self::MIN_NEAR);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position(), self.target, Vec3::UP)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect(), self.near, self.far)
    }

    pub fn viewport_matrix(&self) -> Mat4 {
        Mat4::viewport(self.width as f32, self.height as f32)
    }
}
