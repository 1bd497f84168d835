//! Page source backed by a directory of slide images

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use fast_image_resize as fr;
use image::GenericImageView;
use log::debug;

use super::error::{DecodeError, OpenError};
use super::source::PageSource;
use super::types::{RasterImage, RenderSize};

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// One image file per page, ordered by file name
#[derive(Debug)]
pub struct ImageDirSource {
    pages: Vec<PathBuf>,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self, OpenError> {
        let entries = std::fs::read_dir(dir).map_err(|source| OpenError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut pages: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_supported_image(path))
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(OpenError::Empty(dir.to_path_buf()));
        }

        debug!("Image directory {dir:?}: {} slide images", pages.len());
        Ok(Self { pages })
    }

    #[must_use]
    pub fn page_path(&self, page: usize) -> Option<&Path> {
        self.pages.get(page).map(PathBuf::as_path)
    }
}

impl PageSource for ImageDirSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, page: usize, size: RenderSize) -> Result<RasterImage, DecodeError> {
        let path = self
            .page_path(page)
            .ok_or_else(|| DecodeError::new(page, "no such page"))?;

        let img = image::open(path)
            .map_err(|e| DecodeError::new(page, format!("{}: {e}", path.display())))?;

        let (img_width, img_height) = img.dimensions();
        let target = size.fit(img_width as f32, img_height as f32);
        if target.is_empty() {
            return Err(DecodeError::new(page, format!("empty render size {size}")));
        }

        let rgb = img.to_rgb8();
        if target.width == img_width && target.height == img_height {
            return Ok(RasterImage::new(img_width, img_height, rgb.into_raw()));
        }

        debug!("Resizing page {page} from {img_width}x{img_height} to {target}");
        resize_rgb(rgb.into_raw(), img_width, img_height, target)
            .map_err(|detail| DecodeError::new(page, detail))
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

fn resize_rgb(
    pixels: Vec<u8>,
    src_width: u32,
    src_height: u32,
    target: RenderSize,
) -> Result<RasterImage, String> {
    let src_width = NonZeroU32::new(src_width).ok_or("invalid source width")?;
    let src_height = NonZeroU32::new(src_height).ok_or("invalid source height")?;
    let src_image = fr::Image::from_vec_u8(src_width, src_height, pixels, fr::PixelType::U8x3)
        .map_err(|e| e.to_string())?;

    let dst_width = NonZeroU32::new(target.width).ok_or("invalid target width")?;
    let dst_height = NonZeroU32::new(target.height).ok_or("invalid target height")?;
    let mut dst_image = fr::Image::new(dst_width, dst_height, fr::PixelType::U8x3);

    let mut resizer = fr::Resizer::new(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| e.to_string())?;

    Ok(RasterImage::new(
        target.width,
        target.height,
        dst_image.into_vec(),
    ))
}
