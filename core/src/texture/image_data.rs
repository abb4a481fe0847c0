//! Decoded RGBA8 pixel data.

use super::TextureDataError;

/// Decoded pixels in tightly packed RGBA8 rows.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    /// Bytes per RGBA8 pixel.
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wrap existing RGBA8 pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureDataError> {
        if width == 0 || height == 0 {
            return Err(TextureDataError::ZeroSize);
        }
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(TextureDataError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create transparent black pixels.
    pub fn zeroed(width: u32, height: u32) -> Result<Self, TextureDataError> {
        let len = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        Self::new(width, height, vec![0; len])
    }

    /// Convert a decoded `image` buffer.
    #[cfg(feature = "image")]
    pub fn from_rgba_image(image: image::RgbaImage) -> Result<Self, TextureDataError> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Get one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        let p = &self.pixels[start..start + Self::BYTES_PER_PIXEL];
        Some([p[0], p[1], p[2], p[3]])
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_validation() {
        assert!(ImageData::new(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            ImageData::new(2, 2, vec![0; 15]),
            Err(TextureDataError::SizeMismatch {
                expected: 16,
                actual: 15
            })
        );
        assert_eq!(ImageData::zeroed(0, 4), Err(TextureDataError::ZeroSize));
    }

    #[test]
    fn test_image_data_pixel() {
        let mut pixels = vec![0; 16];
        pixels[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let data = ImageData::new(2, 2, pixels).unwrap();
        assert_eq!(data.pixel(1, 1), Some([1, 2, 3, 4]));
        assert_eq!(data.pixel(2, 0), None);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_from_rgba_image() {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([9, 8, 7, 6]));
        let data = ImageData::from_rgba_image(image).unwrap();
        assert_eq!(data.width(), 3);
        assert_eq!(data.height(), 2);
        assert_eq!(data.pixel(2, 1), Some([9, 8, 7, 6]));
    }
}
