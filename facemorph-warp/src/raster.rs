use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbaImage};

use crate::error::{Result, WarpError};

/// Immutable RGBA8 raster, row-major with a top-left origin.
///
/// Clones share the pixel buffer, so a source image can be handed to any
/// number of concurrent runs without copying.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: Arc<RgbaImage>,
}

impl RasterImage {
    /// Build a raster from an interleaved RGBA buffer.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WarpError::InvalidInput(format!(
                "image dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(WarpError::InvalidInput(format!(
                "buffer length {} does not match {}x{} RGBA ({} bytes)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        let buf = RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| WarpError::InvalidInput("failed to build RGBA buffer".into()))?;
        Ok(Self {
            pixels: Arc::new(buf),
        })
    }

    pub fn from_rgba(img: RgbaImage) -> Result<Self> {
        if img.width() == 0 || img.height() == 0 {
            return Err(WarpError::InvalidInput(format!(
                "image dimensions must be non-zero, got {}x{}",
                img.width(),
                img.height()
            )));
        }
        Ok(Self {
            pixels: Arc::new(img),
        })
    }

    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        Self::from_rgba(img.to_rgba8())
    }

    /// Decode any format the `image` crate understands.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Self::from_dynamic(&img)
    }

    /// Encode to `path`; the format follows the extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.pixels.save(path)?;
        Ok(())
    }

    /// Fill constructor, mostly useful in tests.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Pixel at (x, y). Panics when out of bounds, like `RgbaImage::get_pixel`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Take the pixel buffer, copying only if it is still shared.
    pub fn into_rgba(self) -> RgbaImage {
        Arc::try_unwrap(self.pixels).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.as_raw() == other.as_raw()
    }
}

impl Eq for RasterImage {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            RasterImage::new(0, 10, vec![]),
            Err(WarpError::InvalidInput(_))
        ));
        assert!(RasterImage::filled(10, 0, [0, 0, 0, 255]).is_err());
    }

    #[test]
    fn test_rejects_short_buffer() {
        let err = RasterImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_filled_pixels() {
        let img = RasterImage::filled(3, 2, [1, 2, 3, 4]).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.pixel(2, 1), [1, 2, 3, 4]);
        assert_eq!(img.as_raw().len(), 24);
    }

    #[test]
    fn test_into_rgba_shared_copy() {
        let img = RasterImage::filled(2, 2, [9, 9, 9, 255]).unwrap();
        let other = img.clone();
        let owned = img.into_rgba();
        assert_eq!(owned.as_raw(), other.as_raw());
    }

    #[test]
    fn test_save_and_open() {
        let dir = std::env::temp_dir().join(format!("facemorph-raster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round.png");
        let img = RasterImage::filled(5, 3, [12, 34, 56, 200]).unwrap();
        img.save(&path).unwrap();
        assert_eq!(RasterImage::open(&path).unwrap(), img);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_open_missing_file_is_image_error() {
        let err = RasterImage::open("/nonexistent/facemorph/face.png").unwrap_err();
        assert!(matches!(err, WarpError::Image(_)));
    }
}
