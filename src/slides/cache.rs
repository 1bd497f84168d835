//! Page image cache for one render context.
//!
//! Every entry is rendered at the cache's current [`RenderSize`]. Changing the
//! size clears the whole cache under the lock and bumps a generation counter,
//! so a render that started before the change is never stored after it.
//! Entries are otherwise never evicted: memory is bounded by the pages visited
//! at the current size.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use super::error::{DecodeError, SlideError};
use super::source::PageSource;
use super::types::{RenderSize, RenderedPage, VecExt};

struct CacheState {
    render_size: RenderSize,
    generation: u64,
    /// Indexed by page number, `page_count` slots
    pages: Vec<Option<Arc<RenderedPage>>>,
}

/// Cache of rendered pages for a single render size
pub struct PageImageCache {
    source: Arc<dyn PageSource>,
    page_count: usize,
    state: Mutex<CacheState>,
}

/// Outcome of a warm batch
#[derive(Debug, Default)]
pub struct WarmReport {
    /// Pages rendered and stored by this batch
    pub rendered: Vec<usize>,
    /// Pages already cached or out of range
    pub skipped: Vec<usize>,
    /// Pages the source failed to render
    pub failed: Vec<(usize, DecodeError)>,
    /// The cache was invalidated while the batch ran; remaining pages were dropped
    pub abandoned: bool,
}

impl PageImageCache {
    /// Create an empty cache over `source` rendering at `render_size`
    #[must_use]
    pub fn new(source: Arc<dyn PageSource>, render_size: RenderSize) -> Self {
        let page_count = source.page_count();
        let mut pages = Vec::new();
        pages.reset_to_len(page_count);

        Self {
            source,
            page_count,
            state: Mutex::new(CacheState {
                render_size,
                generation: 0,
                pages,
            }),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    #[must_use]
    pub fn render_size(&self) -> RenderSize {
        self.lock().render_size
    }

    /// Invalidation counter; changes whenever the cache is cleared
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Adopt a new render size, clearing every entry if it differs.
    ///
    /// Returns true if the cache was invalidated.
    pub fn set_render_size(&self, size: RenderSize) -> bool {
        let mut state = self.lock();
        if state.render_size == size {
            return false;
        }

        debug!(
            "Render size {} -> {size}, dropping {} cached pages",
            state.render_size,
            state.pages.iter().flatten().count()
        );
        state.render_size = size;
        Self::invalidate(&mut state, self.page_count);
        true
    }

    /// Clear the cache and bump the generation without changing the size.
    ///
    /// Used when the owning context ends so queued warm batches stop early.
    pub fn retire(&self) {
        let mut state = self.lock();
        Self::invalidate(&mut state, self.page_count);
    }

    /// Get a page, rendering it synchronously on a miss
    pub fn get(&self, page: usize) -> Result<Arc<RenderedPage>, SlideError> {
        self.check_range(page)?;

        let (size, generation) = {
            let state = self.lock();
            if let Some(hit) = &state.pages[page] {
                return Ok(Arc::clone(hit));
            }
            (state.render_size, state.generation)
        };

        let rendered = self.render(page, size)?;
        Ok(self.store(page, generation, rendered).unwrap_or_else(Arc::new))
    }

    /// Render and store every in-range page that is not cached yet
    pub fn warm(&self, pages: &[usize]) -> WarmReport {
        let generation = self.generation();
        self.warm_for_generation(pages, generation)
    }

    /// Like [`warm`](Self::warm), but gives up as soon as the cache generation
    /// no longer matches `generation`.
    pub fn warm_for_generation(&self, pages: &[usize], generation: u64) -> WarmReport {
        let mut report = WarmReport::default();

        for &page in pages {
            let size = {
                let state = self.lock();
                if state.generation != generation {
                    report.abandoned = true;
                    break;
                }
                if page >= self.page_count || state.pages[page].is_some() {
                    report.skipped.push(page);
                    continue;
                }
                state.render_size
            };

            match self.render(page, size) {
                Ok(rendered) => {
                    if self.store(page, generation, rendered).is_err() {
                        report.abandoned = true;
                        break;
                    }
                    report.rendered.push(page);
                }
                Err(err) => report.failed.push((page, err)),
            }
        }

        report
    }

    /// Check if a page is cached at the current size
    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.lock()
            .pages
            .get(page)
            .is_some_and(|slot| slot.is_some())
    }

    /// Cached page numbers in ascending order
    #[must_use]
    pub fn cached_pages(&self) -> Vec<usize> {
        self.lock()
            .pages
            .iter()
            .enumerate()
            .filter_map(|(page, slot)| slot.as_ref().map(|_| page))
            .collect()
    }

    /// Number of cached pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pages.iter().flatten().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_range(&self, page: usize) -> Result<(), SlideError> {
        if page < self.page_count {
            Ok(())
        } else {
            Err(SlideError::OutOfRange {
                index: page,
                page_count: self.page_count,
            })
        }
    }

    fn render(&self, page: usize, size: RenderSize) -> Result<RenderedPage, DecodeError> {
        let image = self.source.render(page, size)?;
        if !image.fits_within(size) {
            warn!(
                "Page {page} rendered at {}x{}, larger than requested {size}",
                image.width, image.height
            );
        }
        Ok(RenderedPage {
            image,
            page,
            render_size: size,
        })
    }

    /// Store a render made under `generation`. The first stored render for a
    /// page wins and every caller gets that entry back. A render from an older
    /// generation is handed back in `Err` without being stored.
    fn store(
        &self,
        page: usize,
        generation: u64,
        rendered: RenderedPage,
    ) -> Result<Arc<RenderedPage>, RenderedPage> {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding stale render of page {page} (generation {generation})");
            return Err(rendered);
        }
        Ok(Arc::clone(
            state.pages[page].get_or_insert_with(|| Arc::new(rendered)),
        ))
    }

    fn invalidate(state: &mut CacheState, page_count: usize) {
        state.pages.reset_to_len(page_count);
        state.generation += 1;
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PageImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("PageImageCache")
            .field("page_count", &self.page_count)
            .field("render_size", &state.render_size)
            .field("generation", &state.generation)
            .field("cached", &state.pages.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

/// In-range pages within `radius` of `page`, nearest first
#[must_use]
pub fn neighbors(page: usize, radius: usize, page_count: usize) -> Vec<usize> {
    if page >= page_count {
        return Vec::new();
    }

    let mut pages = vec![page];
    for offset in 1..=radius.min(page_count) {
        if page + offset < page_count {
            pages.push(page + offset);
        }
        if page >= offset {
            pages.push(page - offset);
        }
    }
    pages
}
