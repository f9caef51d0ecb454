//! Texture decoding

use std::path::Path;

use crate::error::ResourceError;
use crate::rasterizer::Vec3;
use crate::scene::MaterialSampler;

/// Turns an image file into a [`MaterialSampler`]
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<MaterialSampler, ResourceError>;
}

/// Decoder backed by the `image` crate (PNG, JPEG, BMP)
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDecoder;

impl ImageDecoder for FileDecoder {
    fn decode(&self, path: &Path) -> Result<MaterialSampler, ResourceError> {
        if !path.is_file() {
            return Err(ResourceError::NotFound { path: path.to_path_buf() });
        }
        let img = image::open(path).map_err(|e| ResourceError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);

        // Image rows run top-down; samplers store row 0 at the bottom
        let mut texels = Vec::with_capacity(width * height);
        for y in (0..rgb.height()).rev() {
            for x in 0..rgb.width() {
                let p = rgb.get_pixel(x, y);
                texels.push(Vec3::new(
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                ));
            }
        }

        MaterialSampler::new(width, height, texels).ok_or_else(|| ResourceError::Decode {
            path: path.to_path_buf(),
            message: format!("empty image ({}x{})", width, height),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert_eq!(
            FileDecoder.decode(&path),
            Err(ResourceError::NotFound { path: path.clone() })
        );
    }

    #[test]
    fn test_rows_flipped_bottom_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.png");
        // Top row red, bottom row blue
        let img = image::RgbImage::from_fn(2, 2, |_, y| {
            if y == 0 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        img.save(&path).unwrap();

        let sampler = FileDecoder.decode(&path).unwrap();
        assert_eq!((sampler.width(), sampler.height()), (2, 2));
        assert_eq!(sampler.sample(0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(sampler.sample(1.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(FileDecoder.decode(&path), Err(ResourceError::Decode { .. })));
    }
}
