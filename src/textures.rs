//! Particle sprite texture.
//!
//! Point sprites sample this texture when texturing is toggled on (`T`). A
//! sprite can be loaded from an image file or generated procedurally; without
//! `--texture` a soft round disc is used.
//!
//! # Supported Formats
//!
//! - PNG (recommended)
//! - JPEG

use std::path::Path;

use image::error::{ImageError, LimitError, LimitErrorKind};

use crate::error::{ParticleSystemError, Result};

/// RGBA8 image sampled by the fragment shader with linear filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteTexture {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Byte length of a `width` x `height` RGBA8 image, or `None` if it does not
/// fit in `usize`.
pub fn rgba_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(4)
}

fn checked_rgba_len(path: &Path, width: u32, height: u32) -> Result<usize> {
    rgba_len(width, height).ok_or_else(|| ParticleSystemError::TextureDecode {
        path: path.to_path_buf(),
        source: ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError)),
    })
}

impl SpriteTexture {
    /// Create a sprite from raw RGBA data.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not exactly `width * height * 4` bytes.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            Some(data.len()),
            rgba_len(width, height),
            "RGBA data size mismatch"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Load a sprite from an image file.
    ///
    /// An unreadable file is a [`ParticleSystemError::ResourceIo`], a file
    /// that is not a decodable image (or too large to address) a
    /// [`ParticleSystemError::TextureDecode`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ParticleSystemError::ResourceIo {
            path: path.to_path_buf(),
            source,
        })?;
        let img = image::load_from_memory(&bytes)
            .map_err(|source| ParticleSystemError::TextureDecode {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        checked_rgba_len(path, width, height)?;
        log::info!("Loaded sprite {} ({width}x{height})", path.display());
        Ok(Self::from_rgba(img.into_raw(), width, height))
    }

    /// White disc whose alpha falls off smoothly towards the rim.
    pub fn soft_disc(size: u32) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity(rgba_len(size, size).unwrap_or(0));
        let center = (size as f32 - 1.0) * 0.5;
        let radius = (size as f32 * 0.5).max(f32::EPSILON);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 - center) / radius;
                let dy = (y as f32 - center) / radius;
                let d = (dx * dx + dy * dy).sqrt().min(1.0);
                // smoothstep(1, 0, d)
                let t = 1.0 - d;
                let alpha = t * t * (3.0 - 2.0 * t);
                data.extend_from_slice(&[255, 255, 255, (alpha * 255.0).round() as u8]);
            }
        }
        Self::from_rgba(data, size, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_disc_shape() {
        let tex = SpriteTexture::soft_disc(32);
        assert_eq!(tex.data.len(), 32 * 32 * 4);
        let alpha = |x: u32, y: u32| tex.data[((y * 32 + x) * 4 + 3) as usize];
        assert!(alpha(16, 16) > 240);
        assert_eq!(alpha(0, 0), 0);
        assert!(alpha(16, 16) > alpha(24, 16));
    }

    #[test]
    fn test_missing_file_is_resource_io() {
        let err = SpriteTexture::from_file("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ParticleSystemError::ResourceIo { .. }));
        assert_eq!(err.category(), "I/O error");
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let path = std::env::temp_dir().join("particle_interop_not_an_image.png");
        std::fs::write(&path, b"this is not a png").unwrap();
        let err = SpriteTexture::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ParticleSystemError::TextureDecode { .. }));
    }

    #[test]
    fn test_rgba_len_does_not_wrap() {
        assert_eq!(rgba_len(4, 2), Some(32));
        // Overflows u32 arithmetic but not usize
        #[cfg(target_pointer_width = "64")]
        assert_eq!(rgba_len(70_000, 70_000), Some(19_600_000_000));
        assert_eq!(rgba_len(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_oversized_dimensions_are_decode_errors() {
        let err = checked_rgba_len(Path::new("huge.png"), u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, ParticleSystemError::TextureDecode { .. }));
        assert_eq!(err.category(), "I/O error");
        assert!(err.to_string().contains("huge.png"));
    }

    #[test]
    #[should_panic(expected = "RGBA data size mismatch")]
    fn test_from_rgba_rejects_short_data() {
        SpriteTexture::from_rgba(vec![0; 12], 2, 2);
    }

    #[test]
    fn test_png_round_trip_through_file() {
        let path = std::env::temp_dir().join("particle_interop_sprite.png");
        let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 40]));
        img.save(&path).unwrap();

        let tex = SpriteTexture::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(&tex.data[..4], &[10, 20, 30, 40]);
    }
}
