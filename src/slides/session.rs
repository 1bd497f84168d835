//! Presentation session state machine.
//!
//! A session is either inactive or presenting one document on one display
//! surface. All mutating operations are expected on a single owner thread;
//! the only work that leaves that thread is neighbour warming, which runs on
//! a [`WarmPool`].
//!
//! Every successful navigation sends exactly one [`SessionEvent`] on the
//! session's event channel, after the slide image is in hand. Navigation that
//! fails or does not move sends nothing.

use std::fmt;
use std::sync::Arc;

use flume::Sender;
use log::{debug, info, warn};

use super::DEFAULT_WARM_RADIUS;
use super::cache::{PageImageCache, neighbors};
use super::display::DisplaySurface;
use super::error::SlideError;
use super::source::PageSource;
use super::transition::{Direction, TransitionDescriptor, TransitionStyle, describe};
use super::types::{RenderSize, RenderedPage};
use super::worker::WarmPool;

/// Lifecycle of a presentation session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Inactive,
    Active,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => f.write_str("inactive"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// A slide to put on screen
#[derive(Clone, Debug)]
pub struct SlideChange {
    pub index: usize,
    pub page: Arc<RenderedPage>,
    /// `None` means show instantly
    pub transition: Option<TransitionDescriptor>,
}

/// Notifications sent from the session to its host, in order
#[derive(Clone, Debug)]
pub enum SessionEvent {
    SlideChanged(SlideChange),
    Ended { last_index: usize },
}

struct ActiveSlides {
    cache: Arc<PageImageCache>,
    current_index: usize,
    display_target: DisplaySurface,
}

/// Presents one document at a time
pub struct PresentationSession {
    events: Sender<SessionEvent>,
    warm_pool: Option<WarmPool>,
    warm_radius: usize,
    transition_style: TransitionStyle,
    active: Option<ActiveSlides>,
}

impl PresentationSession {
    /// Create an inactive session that reports to `events`.
    ///
    /// Without a warm pool no pages are pre-rendered.
    #[must_use]
    pub fn new(events: Sender<SessionEvent>) -> Self {
        Self {
            events,
            warm_pool: None,
            warm_radius: DEFAULT_WARM_RADIUS,
            transition_style: TransitionStyle::default(),
            active: None,
        }
    }

    #[must_use]
    pub fn with_warm_pool(mut self, pool: WarmPool) -> Self {
        self.warm_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_warm_radius(mut self, radius: usize) -> Self {
        self.warm_radius = radius;
        self
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        if self.active.is_some() {
            Lifecycle::Active
        } else {
            Lifecycle::Inactive
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Current slide, if presenting
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.current_index)
    }

    #[must_use]
    pub fn display_target(&self) -> Option<&DisplaySurface> {
        self.active.as_ref().map(|a| &a.display_target)
    }

    #[must_use]
    pub fn cache(&self) -> Option<&Arc<PageImageCache>> {
        self.active.as_ref().map(|a| &a.cache)
    }

    #[must_use]
    pub fn transition_style(&self) -> TransitionStyle {
        self.transition_style
    }

    #[must_use]
    pub fn warm_pool(&self) -> Option<&WarmPool> {
        self.warm_pool.as_ref()
    }

    /// Begin presenting `source` on `display_target`.
    ///
    /// The first slide is shown without a transition. `at_index` is clamped
    /// to the document. On failure the session stays inactive.
    pub fn start(
        &mut self,
        source: Arc<dyn PageSource>,
        at_index: usize,
        style: TransitionStyle,
        display_target: DisplaySurface,
    ) -> Result<(), SlideError> {
        self.require(Lifecycle::Inactive, "start")?;

        let page_count = source.page_count();
        if page_count == 0 {
            return Err(SlideError::OutOfRange {
                index: at_index,
                page_count,
            });
        }

        let index = at_index.min(page_count - 1);
        let render_size = display_target.render_size();
        let cache = Arc::new(PageImageCache::new(source, render_size));
        let page = cache.get(index)?;

        info!(
            "Presentation started at slide {index} on {} {} ({render_size})",
            display_target.id, display_target.name
        );
        self.transition_style = style;
        self.active = Some(ActiveSlides {
            cache,
            current_index: index,
            display_target,
        });

        self.emit(SessionEvent::SlideChanged(SlideChange {
            index,
            page,
            transition: None,
        }));
        self.schedule_warm();
        Ok(())
    }

    /// Step one slide. Stepping past either end is a no-op; returns whether
    /// the slide changed.
    pub fn advance(&mut self, direction: Direction) -> Result<bool, SlideError> {
        let active = self.active_mut("advance")?;

        let target = match direction {
            Direction::Forward => active.current_index + 1,
            Direction::Backward => match active.current_index.checked_sub(1) {
                Some(target) => target,
                None => return Ok(false),
            },
        };
        if target >= active.cache.page_count() {
            debug!("Already at last slide");
            return Ok(false);
        }

        self.show(target, direction)?;
        Ok(true)
    }

    /// Show a specific slide, animating forward unless it lies before the
    /// current one.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SlideError> {
        let active = self.active_mut("jump")?;

        let page_count = active.cache.page_count();
        if index >= page_count {
            return Err(SlideError::OutOfRange { index, page_count });
        }

        let direction = Direction::between(active.current_index, index);
        self.show(index, direction)
    }

    /// Select the style used from the next navigation on
    pub fn set_transition_style(&mut self, style: TransitionStyle) {
        debug!("Transition style {} -> {style}", self.transition_style);
        self.transition_style = style;
    }

    /// Track a new presentation surface size. The visible slide is not
    /// re-rendered until the next navigation or [`refresh`](Self::refresh).
    ///
    /// Returns true if cached slides were dropped.
    pub fn handle_resize(&mut self, size: RenderSize) -> bool {
        match &self.active {
            Some(active) => active.cache.set_render_size(size),
            None => {
                debug!("Ignoring resize to {size}, not presenting");
                false
            }
        }
    }

    /// Re-send the current slide at the current render size, without a
    /// transition.
    pub fn refresh(&mut self) -> Result<(), SlideError> {
        let active = self.active_mut("refresh")?;

        let index = active.current_index;
        let page = active.cache.get(index)?;
        self.emit(SessionEvent::SlideChanged(SlideChange {
            index,
            page,
            transition: None,
        }));
        self.schedule_warm();
        Ok(())
    }

    /// Move the presentation to another surface. Refreshes the slide when the
    /// render size changes; returns whether it did.
    pub fn retarget(&mut self, display_target: DisplaySurface) -> Result<bool, SlideError> {
        let active = self.active_mut("retarget")?;

        let size = display_target.render_size();
        info!(
            "Presentation moved to {} {} ({size})",
            display_target.id, display_target.name
        );
        active.display_target = display_target;

        if self.handle_resize(size) {
            self.refresh()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Stop presenting and report the final slide
    pub fn end(&mut self) -> Result<usize, SlideError> {
        let active = self.active.take().ok_or(SlideError::InvalidState {
            operation: "end",
            state: Lifecycle::Inactive,
        })?;

        let last_index = active.current_index;
        active.cache.retire();
        info!("Presentation ended at slide {last_index}");
        self.emit(SessionEvent::Ended { last_index });
        Ok(last_index)
    }

    /// Fetch, commit and announce a slide. Nothing changes if the fetch fails.
    fn show(&mut self, index: usize, direction: Direction) -> Result<(), SlideError> {
        let style = self.transition_style;
        let active = self.active_mut("navigate")?;

        let page = active.cache.get(index)?;
        active.current_index = index;

        self.emit(SessionEvent::SlideChanged(SlideChange {
            index,
            page,
            transition: Some(describe(style, direction)),
        }));
        self.schedule_warm();
        Ok(())
    }

    fn schedule_warm(&mut self) {
        let (Some(pool), Some(active)) = (self.warm_pool.as_mut(), self.active.as_ref()) else {
            return;
        };

        let pages: Vec<usize> = neighbors(
            active.current_index,
            self.warm_radius,
            active.cache.page_count(),
        )
        .into_iter()
        .filter(|&page| !active.cache.contains(page))
        .collect();

        if !pages.is_empty() {
            pool.schedule(&active.cache, pages);
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            warn!("Session event receiver dropped");
        }
    }

    fn require(&self, expected: Lifecycle, operation: &'static str) -> Result<(), SlideError> {
        let state = self.lifecycle();
        if state == expected {
            Ok(())
        } else {
            Err(SlideError::InvalidState { operation, state })
        }
    }

    fn active_mut(&mut self, operation: &'static str) -> Result<&mut ActiveSlides, SlideError> {
        self.active.as_mut().ok_or(SlideError::InvalidState {
            operation,
            state: Lifecycle::Inactive,
        })
    }
}

impl fmt::Debug for PresentationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationSession")
            .field("lifecycle", &self.lifecycle())
            .field("current_index", &self.current_index())
            .field("transition_style", &self.transition_style)
            .field("warm_radius", &self.warm_radius)
            .finish_non_exhaustive()
    }
}
