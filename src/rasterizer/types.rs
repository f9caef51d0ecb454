//! Core types for the rasterizer

use serde::{Deserialize, Serialize};
use super::math::Vec3;

/// 8-bit RGB color as stored in the framebuffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Quantize a normalized color, clamping each channel to [0, 1]
    pub fn from_normalized(c: Vec3) -> Self {
        let c = c.clamp01();
        Self {
            r: (c.x * 255.0).round() as u8,
            g: (c.y * 255.0).round() as u8,
            b: (c.z * 255.0).round() as u8,
        }
    }

    /// Packed framebuffer word. Byte order in memory is blue, green, red,
    /// unused.
    pub fn to_bgrx(self) -> u32 {
        u32::from_le_bytes([self.b, self.g, self.r, 0])
    }

    pub fn from_bgrx(word: u32) -> Self {
        let [b, g, r, _] = word.to_le_bytes();
        Self { r, g, b }
    }

    /// Convert to [u8; 4] RGBA for display
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// What the engine draws for each polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    /// One pixel per visible vertex
    Vertices,
    /// Polygon edges through the active line strategy, no depth test
    Wireframe,
    /// Lambert, one intensity per face
    Flat,
    /// Lambert lit per vertex, color interpolated across the face
    Gouraud,
    /// Normal interpolated, Lambert evaluated per pixel
    PhongShading,
    /// Normal and world position interpolated, Blinn-Phong per pixel
    PhongLighting,
    /// Blinn-Phong fed by material maps, perspective-correct attributes
    Textured,
}

impl DrawMode {
    /// Every mode, in cycling order
    pub const ALL: [DrawMode; 7] = [
        DrawMode::Vertices,
        DrawMode::Wireframe,
        DrawMode::Flat,
        DrawMode::Gouraud,
        DrawMode::PhongShading,
        DrawMode::PhongLighting,
        DrawMode::Textured,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DrawMode::Vertices => "Vertices",
            DrawMode::Wireframe => "Wireframe",
            DrawMode::Flat => "Flat",
            DrawMode::Gouraud => "Gouraud",
            DrawMode::PhongShading => "Phong shading",
            DrawMode::PhongLighting => "Phong lighting",
            DrawMode::Textured => "Textured",
        }
    }
}

/// Background, fill and edge colors (normalized RGB)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Vec3,
    pub surface: Vec3,
    pub edge: Vec3,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Vec3::ZERO,
            surface: Vec3::ONE,
            edge: Vec3::ONE,
        }
    }
}

impl Palette {
    /// Replace every color with its complement
    pub fn invert(&mut self) {
        self.background = Vec3::ONE - self.background;
        self.surface = Vec3::ONE - self.surface;
        self.edge = Vec3::ONE - self.edge;
    }
}

/// Light source and Blinn-Phong coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub k_ambient: f32,
    pub k_diffuse: f32,
    pub k_specular: f32,
    pub shininess: f32,
    pub ambient_color: Vec3,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    pub light_color: Vec3,
    /// World-space light position; `None` puts the light at the camera
    pub light_position: Option<Vec3>,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            k_ambient: 0.1,
            k_diffuse: 0.8,
            k_specular: 0.5,
            shininess: 32.0,
            ambient_color: Vec3::ONE,
            diffuse_color: Vec3::new(0.8, 0.8, 0.8),
            specular_color: Vec3::ONE,
            light_color: Vec3::ONE,
            light_position: None,
        }
    }
}

impl Lighting {
    pub const K_STEP: f32 = 0.05;
    pub const COLOR_STEP: f32 = 0.05;

    /// Add to the coefficients, none of which may go negative
    pub fn adjust_coefficients(&mut self, ambient: f32, diffuse: f32, specular: f32, shininess: f32) {
        self.k_ambient = (self.k_ambient + ambient).max(0.0);
        self.k_diffuse = (self.k_diffuse + diffuse).max(0.0);
        self.k_specular = (self.k_specular + specular).max(0.0);
        self.shininess = (self.shininess + shininess).max(0.0);
    }

    /// Add to the light colors, each channel kept in [0, 1]
    pub fn adjust_colors(&mut self, ambient: Vec3, diffuse: Vec3, specular: Vec3) {
        self.ambient_color = (self.ambient_color + ambient).clamp01();
        self.diffuse_color = (self.diffuse_color + diffuse).clamp01();
        self.specular_color = (self.specular_color + specular).clamp01();
    }
}
