//! Core types for slide rendering

use serde::{Deserialize, Serialize};

/// Target raster size in device pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Scale a logical size by a backing scale factor, rounding to whole pixels
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        Self {
            width: (self.width as f32 * factor).round() as u32,
            height: (self.height as f32 * factor).round() as u32,
        }
    }

    /// Largest size with the content's aspect ratio that fits inside `self`.
    ///
    /// Each side is at least one pixel unless `self` is empty. Content with a
    /// degenerate aspect ratio fills the whole size.
    #[must_use]
    pub fn fit(self, content_width: f32, content_height: f32) -> Self {
        if self.is_empty() {
            return Self::default();
        }
        if !(content_width > 0.0 && content_height > 0.0) {
            return self;
        }

        let view_width = self.width as f32;
        let view_height = self.height as f32;
        let mag = if content_width / content_height > view_width / view_height {
            view_width / content_width
        } else {
            view_height / content_height
        };

        Self {
            width: ((content_width * mag).round() as u32).clamp(1, self.width),
            height: ((content_height * mag).round() as u32).clamp(1, self.height),
        }
    }
}

impl std::fmt::Display for RenderSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raw rendered page image.
///
/// Packed RGB pixel data (3 bytes per pixel, row-major, no padding).
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Raw RGB pixel data
    pub pixels: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl RasterImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::BYTES_PER_PIXEL
        );
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Single-colour image
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * Self::BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&rgb);
        }
        Self::new(width, height, pixels)
    }

    #[must_use]
    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }

    #[must_use]
    pub fn fits_within(&self, size: RenderSize) -> bool {
        self.width <= size.width && self.height <= size.height
    }
}

impl std::fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// A page rendered for one specific render size
#[derive(Clone, Debug)]
pub struct RenderedPage {
    /// Rendered image data
    pub image: RasterImage,
    /// Page number (0-indexed)
    pub page: usize,
    /// Size the page was rendered for
    pub render_size: RenderSize,
}

/// Extension trait for Vec operations
pub trait VecExt<T> {
    /// Reset vector to a given length, clearing existing items
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default;
}

impl<T> VecExt<T> for Vec<T> {
    #[inline]
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default,
    {
        self.clear();
        self.resize_with(len, T::default);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_wide_content_is_width_bound() {
        let size = RenderSize::new(1000, 1000);
        assert_eq!(size.fit(1600.0, 900.0), RenderSize::new(1000, 563));
    }

    #[test]
    fn fit_tall_content_is_height_bound() {
        let size = RenderSize::new(1920, 1080);
        assert_eq!(size.fit(612.0, 792.0), RenderSize::new(835, 1080));
    }

    #[test]
    fn fit_same_aspect_fills_everything() {
        let size = RenderSize::new(1920, 1080);
        assert_eq!(size.fit(16.0, 9.0), size);
    }

    #[test]
    fn fit_never_collapses_to_zero() {
        let size = RenderSize::new(100, 2);
        let fitted = size.fit(1.0, 1000.0);
        assert_eq!(fitted.width, 1);
        assert_eq!(fitted.height, 2);
    }

    #[test]
    fn fit_into_empty_size_is_empty() {
        assert!(RenderSize::new(0, 10).fit(4.0, 3.0).is_empty());
    }

    #[test]
    fn scaled_applies_backing_factor() {
        assert_eq!(
            RenderSize::new(1440, 900).scaled(2.0),
            RenderSize::new(2880, 1800)
        );
        assert_eq!(
            RenderSize::new(1440, 900).scaled(f32::NAN),
            RenderSize::new(1440, 900)
        );
    }

    #[test]
    fn filled_image_has_rgb_layout() {
        let image = RasterImage::filled(2, 3, [1, 2, 3]);
        assert_eq!(image.pixels.len(), 18);
        assert_eq!(&image.pixels[..6], &[1, 2, 3, 1, 2, 3]);
        assert!(image.fits_within(RenderSize::new(2, 3)));
        assert!(!image.fits_within(RenderSize::new(1, 3)));
    }

    #[test]
    fn reset_to_len_clears_and_resizes() {
        let mut slots = vec![Some(1), Some(2)];
        slots.reset_to_len(4);
        assert_eq!(slots, vec![None, None, None, None]);
    }
}
