//! Page sources: the document side of the slide engine

use std::path::Path;
use std::sync::Arc;

use log::info;

use super::error::{DecodeError, OpenError};
use super::image_dir::ImageDirSource;
use super::types::{RasterImage, RenderSize};

/// A paginated document that can rasterize its pages.
///
/// Rendering is synchronous and may be slow. Implementations are shared
/// between the presenting thread and background warm workers.
pub trait PageSource: Send + Sync {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Render `page` so that it fits inside `size`, preserving its aspect ratio
    fn render(&self, page: usize, size: RenderSize) -> Result<RasterImage, DecodeError>;
}

/// Open a document at `path`.
///
/// Directories are read as one image per page; `.pdf` files need the `pdf`
/// feature.
pub fn open_source(path: &Path) -> Result<Arc<dyn PageSource>, OpenError> {
    if !path.exists() {
        return Err(OpenError::NotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        let source = ImageDirSource::open(path)?;
        info!(
            "Opened image directory {path:?} with {} pages",
            source.page_count()
        );
        return Ok(Arc::new(source));
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    #[cfg(feature = "pdf")]
    if is_pdf {
        let source = super::pdf_source::PdfSource::open(path)?;
        info!("Opened PDF {path:?} with {} pages", source.page_count());
        return Ok(Arc::new(source));
    }

    #[cfg(not(feature = "pdf"))]
    if is_pdf {
        log::warn!("{path:?} is a PDF but slidedeck was built without the `pdf` feature");
    }

    Err(OpenError::Unsupported(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_found() {
        let err = open_source(Path::new("/definitely/not/here.pdf")).err();
        assert!(matches!(err, Some(OpenError::NotFound(_))));
    }

    #[test]
    fn plain_file_is_unsupported() {
        let file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        let err = open_source(file.path()).err();
        assert!(matches!(err, Some(OpenError::Unsupported(_))));
    }
}
