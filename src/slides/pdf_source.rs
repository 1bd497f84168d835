//! PDF page source backed by MuPDF

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::error::{DecodeError, OpenError};
use super::source::PageSource;
use super::types::{RasterImage, RenderSize};

thread_local! {
    // MuPDF documents are not Send, so every thread that renders keeps its own
    // handle, keyed by path.
    static OPEN_DOCUMENTS: RefCell<HashMap<PathBuf, Document>> = RefCell::new(HashMap::new());
}

/// A PDF document; one page per slide
#[derive(Debug)]
pub struct PdfSource {
    path: PathBuf,
    page_count: usize,
}

impl PdfSource {
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let doc = Document::open(path.to_string_lossy().as_ref())?;
        let page_count = doc.page_count()?.max(0) as usize;
        if page_count == 0 {
            return Err(OpenError::Empty(path.to_path_buf()));
        }

        let path = path.to_path_buf();
        OPEN_DOCUMENTS.with(|docs| docs.borrow_mut().insert(path.clone(), doc));

        Ok(Self { path, page_count })
    }

    fn with_document<T>(
        &self,
        page: usize,
        f: impl FnOnce(&Document) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        OPEN_DOCUMENTS.with(|docs| {
            let mut docs = docs.borrow_mut();
            if !docs.contains_key(&self.path) {
                debug!("Opening {:?} on {:?}", self.path, std::thread::current().id());
                let doc = Document::open(self.path.to_string_lossy().as_ref())
                    .map_err(|e| DecodeError::new(page, e.to_string()))?;
                docs.insert(self.path.clone(), doc);
            }
            let doc = docs
                .get(&self.path)
                .ok_or_else(|| DecodeError::new(page, "document handle missing"))?;
            f(doc)
        })
    }
}

impl Drop for PdfSource {
    // Handles opened by other threads go when those threads exit.
    fn drop(&mut self) {
        let _ = OPEN_DOCUMENTS.try_with(|docs| {
            if docs.borrow_mut().remove(&self.path).is_some() {
                debug!("Closed {:?}", self.path);
            }
        });
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render(&self, page_num: usize, size: RenderSize) -> Result<RasterImage, DecodeError> {
        let pdf_err = |e: mupdf::error::Error| DecodeError::new(page_num, e.to_string());

        self.with_document(page_num, |doc| {
            let page = doc.load_page(page_num as i32).map_err(pdf_err)?;
            let bounds = page.bounds().map_err(pdf_err)?;
            let page_width = bounds.x1 - bounds.x0;
            let page_height = bounds.y1 - bounds.y0;

            let target = size.fit(page_width, page_height);
            if target.is_empty() || page_width <= 0.0 || page_height <= 0.0 {
                return Err(DecodeError::new(page_num, format!("cannot fit page into {size}")));
            }

            let mag = (target.width as f32 / page_width).min(target.height as f32 / page_height);
            let transform = Matrix::new_scale(mag, mag);
            let rgb = Colorspace::device_rgb();
            let pixmap = page
                .to_pixmap(&transform, &rgb, false, false)
                .map_err(pdf_err)?;

            let pixels =
                pixmap_to_rgb(&pixmap).map_err(|detail| DecodeError::new(page_num, detail))?;
            Ok(RasterImage::new(pixmap.width(), pixmap.height(), pixels))
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;

    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".to_string());
    }

    let mut out = Vec::with_capacity(width * height * RasterImage::BYTES_PER_PIXEL);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}
