//! Render configuration
//!
//! Uses RON (Rusty Object Notation) so settings files stay hand-editable.
//! Every field is optional; missing ones take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rasterizer::{DrawMode, LineStrategy, Lighting, Palette};
use crate::scene::CameraSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub palette: Palette,
    pub lighting: Lighting,
    pub camera: CameraSettings,
    pub draw_mode: DrawMode,
    pub line_strategy: LineStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            palette: Palette::default(),
            lighting: Lighting::default(),
            camera: CameraSettings::default(),
            draw_mode: DrawMode::PhongLighting,
            line_strategy: LineStrategy::Bresenham,
        }
    }
}

impl RenderConfig {
    /// Load from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&contents)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse from a RON string (for embedded configs or testing)
    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(s)?)
    }

    /// Save to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
