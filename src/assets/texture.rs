//! Texture decoding into RGBA8 pixel buffers

use std::path::Path;

use log::info;

use super::AssetError;

/// Decoded RGBA8 image
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// A single-colour image
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let rgba = rgba.repeat((width * height) as usize);
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn from_image(image: image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            rgba: rgba.into_raw(),
        }
    }

    /// Decodes an encoded image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Self::from_image(image::load_from_memory(bytes)?))
    }

    /// Copy scaled down to fit `max` on both axes, or `None` when it already fits
    pub fn fit_within(&self, max: u32) -> Option<Self> {
        let (width, height) = fitted_size(self.width, self.height, max);
        if (width, height) == (self.width, self.height) {
            return None;
        }
        let source = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
            self.width,
            self.height,
            &self.rgba[..],
        )?;
        let resized = image::imageops::resize(
            &source,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        Some(Self {
            width,
            height,
            rgba: resized.into_raw(),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba[i..i + 4].try_into().ok()
    }
}

/// Largest size no bigger than `max` on either axis with the same aspect ratio
pub fn fitted_size(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = max as f64 / width.max(height) as f64;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    (fit(width), fit(height))
}

/// Loads and decodes a texture image from disk
pub fn load_texture(path: impl AsRef<Path>) -> Result<PixelBuffer, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| AssetError::Texture {
        path: path.to_path_buf(),
        source,
    })?;
    let pixels = PixelBuffer::from_image(image);
    info!(
        "Loaded texture {} ({}x{})",
        path.display(),
        pixels.width,
        pixels.height
    );
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_fills_every_pixel() {
        let pixels = PixelBuffer::solid(3, 2, [10, 20, 30, 255]);
        assert_eq!(pixels.rgba.len(), 3 * 2 * 4);
        assert_eq!(pixels.pixel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(pixels.pixel(3, 0), None);
    }

    #[test]
    fn test_decode_png_from_memory() {
        let mut encoded = Vec::new();
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([0, 34, 148, 255]));
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let pixels = PixelBuffer::from_bytes(&encoded).unwrap();
        assert_eq!((pixels.width, pixels.height), (4, 2));
        assert_eq!(pixels.pixel(3, 1), Some([0, 34, 148, 255]));
    }

    #[test]
    fn test_fitted_size_keeps_aspect() {
        assert_eq!(fitted_size(8192, 4096, 4096), (4096, 2048));
        assert_eq!(fitted_size(2048, 8192, 4096), (1024, 4096));
        assert_eq!(fitted_size(4097, 1, 4096), (4096, 1));
        assert_eq!(fitted_size(4096, 4096, 4096), (4096, 4096));
        assert_eq!(fitted_size(640, 480, 4096), (640, 480));
    }

    #[test]
    fn test_fit_within_downscales_oversized() {
        let pixels = PixelBuffer::solid(10, 4, [0, 34, 148, 255]);
        assert!(pixels.fit_within(10).is_none());

        let fitted = pixels.fit_within(5).unwrap();
        assert_eq!((fitted.width, fitted.height), (5, 2));
        assert_eq!(fitted.rgba.len(), 5 * 2 * 4);
        let [r, g, b, a] = fitted.pixel(4, 1).unwrap();
        assert!(r <= 1 && g.abs_diff(34) <= 1 && b.abs_diff(148) <= 1 && a >= 254);
    }

    #[test]
    fn test_missing_texture_reports_path() {
        let err = load_texture("does/not/exist.png").unwrap_err();
        assert!(matches!(err, AssetError::Texture { .. }));
        assert!(err.to_string().contains("does/not/exist.png"));
    }
}
