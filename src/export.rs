//! Writing displayed slides out as PNG files

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use log::{debug, info};

use crate::slides::{RenderedPage, SlideChange};

/// Receives everything the presentation surface would show
pub trait SlideSink {
    /// A slide became visible on the presentation surface
    fn slide_changed(&mut self, change: &SlideChange, page_count: usize) -> Result<()>;

    /// The control surface now shows `page` as the review selection
    fn review_changed(&mut self, page: &RenderedPage, page_count: usize) -> Result<()>;

    /// Anything else worth telling the user
    fn notice(&mut self, message: &str) -> Result<()>;
}

/// Saves each slide as `slide-NNN.png` and prints one status line per change
pub struct PngExporter<W: Write> {
    dir: PathBuf,
    status: W,
    last_written: Option<PathBuf>,
}

impl<W: Write> PngExporter<W> {
    pub fn new(dir: &Path, status: W) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
        info!("Exporting slides to {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            status,
            last_written: None,
        })
    }

    /// The most recently written file
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    pub fn status(&self) -> &W {
        &self.status
    }

    /// Save one rendered page as a PNG
    pub fn save(&mut self, page: &RenderedPage, name: &str) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let image = &page.image;
        let buffer = RgbImage::from_raw(image.width, image.height, image.pixels.clone())
            .with_context(|| format!("Page {} has a malformed pixel buffer", page.page))?;
        buffer
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        self.last_written = Some(path.clone());
        Ok(path)
    }

    fn status_line(&mut self, line: &str) -> Result<()> {
        write!(self.status, "{line}\r\n")?;
        self.status.flush()?;
        Ok(())
    }
}

pub fn slide_file_name(index: usize) -> String {
    format!("slide-{:03}.png", index + 1)
}

impl<W: Write> SlideSink for PngExporter<W> {
    fn slide_changed(&mut self, change: &SlideChange, page_count: usize) -> Result<()> {
        let path = self.save(&change.page, &slide_file_name(change.index))?;
        let transition = change
            .transition
            .as_ref()
            .map_or_else(|| "cut".to_string(), ToString::to_string);
        self.status_line(&format!(
            "slide {}/{page_count} | {transition} | {} | {}",
            change.index + 1,
            change.page.render_size,
            path.display()
        ))
    }

    fn review_changed(&mut self, page: &RenderedPage, page_count: usize) -> Result<()> {
        let path = self.save(page, "review.png")?;
        self.status_line(&format!(
            "review slide {}/{page_count} | {} | {}",
            page.page + 1,
            page.render_size,
            path.display()
        ))
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        self.status_line(message)
    }
}
