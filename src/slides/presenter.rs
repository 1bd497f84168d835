//! Presenter - routes host commands to the review context and the session

use std::sync::Arc;

use flume::Sender;
use log::{debug, info};

use super::cache::PageImageCache;
use super::command::HostCommand;
use super::display::{DisplayPolicy, DisplaySurface, resolve};
use super::error::SlideError;
use super::session::{PresentationSession, SessionEvent};
use super::source::PageSource;
use super::transition::{Direction, TransitionStyle};
use super::types::RenderedPage;
use super::worker::WarmPool;
use super::{DEFAULT_WARM_RADIUS, DEFAULT_WARM_WORKERS};

/// Presenter configuration
#[derive(Clone, Debug, PartialEq)]
pub struct PresenterConfig {
    pub transition: TransitionStyle,
    pub display_policy: DisplayPolicy,
    /// Slides on each side of the current one to pre-render
    pub warm_radius: usize,
    /// Background warm threads; 0 disables warming
    pub warm_workers: usize,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            transition: TransitionStyle::default(),
            display_policy: DisplayPolicy::default(),
            warm_radius: DEFAULT_WARM_RADIUS,
            warm_workers: DEFAULT_WARM_WORKERS,
        }
    }
}

/// One open document with a review context and a presentation session.
///
/// The review context renders for the control surface and has its own cache,
/// independent of the session's cache for the presentation surface.
pub struct Presenter {
    source: Arc<dyn PageSource>,
    session: PresentationSession,
    surfaces: Vec<DisplaySurface>,
    control: DisplaySurface,
    policy: DisplayPolicy,
    transition: TransitionStyle,
    review: PageImageCache,
    review_index: usize,
}

impl Presenter {
    #[must_use]
    pub fn new(
        source: Arc<dyn PageSource>,
        control: DisplaySurface,
        surfaces: Vec<DisplaySurface>,
        config: PresenterConfig,
        events: Sender<SessionEvent>,
    ) -> Self {
        let mut session = PresentationSession::new(events).with_warm_radius(config.warm_radius);
        if config.warm_workers > 0 {
            session = session.with_warm_pool(WarmPool::new(config.warm_workers));
        }

        let review = PageImageCache::new(Arc::clone(&source), control.render_size());

        Self {
            source,
            session,
            surfaces,
            control,
            policy: config.display_policy,
            transition: config.transition,
            review,
            review_index: 0,
        }
    }

    /// Apply one host command
    pub fn apply(&mut self, cmd: HostCommand) -> Result<(), SlideError> {
        debug!("Host command {cmd:?}");
        match cmd {
            HostCommand::Next => self.session.advance(Direction::Forward).map(drop),
            HostCommand::Previous => self.session.advance(Direction::Backward).map(drop),
            HostCommand::JumpTo(index) => self.session.jump_to(index),
            HostCommand::SetTransition(style) => {
                self.set_transition(style);
                Ok(())
            }
            HostCommand::CycleTransition => {
                self.set_transition(self.transition.next());
                Ok(())
            }
            HostCommand::Resize(size) => {
                if self.session.is_active() {
                    self.session.handle_resize(size);
                } else {
                    self.review.set_render_size(size);
                }
                Ok(())
            }
            HostCommand::SelectDisplay(policy) => {
                self.policy = policy;
                self.follow_display_target(true)
            }
            HostCommand::StartPresentation => {
                let target = self.presentation_target();
                self.session.start(
                    Arc::clone(&self.source),
                    self.review_index,
                    self.transition,
                    target,
                )
            }
            HostCommand::EndPresentation => {
                self.review_index = self.session.end()?;
                Ok(())
            }
            HostCommand::Refresh => self.session.refresh(),
            HostCommand::SelectSlide(index) => {
                if self.session.is_active() {
                    return self.session.jump_to(index);
                }
                let page_count = self.page_count();
                if index >= page_count {
                    return Err(SlideError::OutOfRange { index, page_count });
                }
                self.review_index = index;
                Ok(())
            }
            HostCommand::SurfacesChanged { surfaces, control } => {
                info!("Display configuration changed: {} surfaces", surfaces.len());
                self.review.set_render_size(control.render_size());
                self.surfaces = surfaces;
                self.control = control;
                let automatic = matches!(
                    self.policy,
                    DisplayPolicy::Automatic | DisplayPolicy::Explicit(0)
                );
                self.follow_display_target(automatic)
            }
        }
    }

    /// Surface the presentation would use under the current policy
    #[must_use]
    pub fn presentation_target(&self) -> DisplaySurface {
        resolve(self.policy, &self.surfaces, &self.control)
    }

    /// Review selection rendered for the control surface
    pub fn review_page(&self) -> Result<Arc<RenderedPage>, SlideError> {
        self.review.get(self.review_index)
    }

    #[must_use]
    pub fn review_index(&self) -> usize {
        self.review_index
    }

    #[must_use]
    pub fn review_cache(&self) -> &PageImageCache {
        &self.review
    }

    #[must_use]
    pub fn session(&self) -> &PresentationSession {
        &self.session
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }

    #[must_use]
    pub fn transition_style(&self) -> TransitionStyle {
        self.transition
    }

    #[must_use]
    pub fn display_policy(&self) -> DisplayPolicy {
        self.policy
    }

    #[must_use]
    pub fn surfaces(&self) -> &[DisplaySurface] {
        &self.surfaces
    }

    #[must_use]
    pub fn control_surface(&self) -> &DisplaySurface {
        &self.control
    }

    fn set_transition(&mut self, style: TransitionStyle) {
        self.transition = style;
        self.session.set_transition_style(style);
    }

    /// Move a running presentation when its target should change. With
    /// `re_resolve` unset the current target only moves if it disappeared;
    /// otherwise it just picks up the host's updated descriptor.
    fn follow_display_target(&mut self, re_resolve: bool) -> Result<(), SlideError> {
        let Some(current) = self.session.display_target() else {
            return Ok(());
        };

        let refreshed = self.surfaces.iter().find(|s| s.id == current.id).cloned();
        let target = match refreshed {
            Some(surface) if !re_resolve => surface,
            _ => self.presentation_target(),
        };

        if &target != current {
            self.session.retarget(target)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("page_count", &self.page_count())
            .field("policy", &self.policy)
            .field("transition", &self.transition)
            .field("review_index", &self.review_index)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use flume::Receiver;

    use super::*;
    use crate::slides::RenderSize;
    use crate::slides::display::SurfaceId;
    use crate::slides::session::SlideChange;
    use crate::test_utils::FakeDeck;

    fn laptop() -> DisplaySurface {
        DisplaySurface::new(1, 144, 90).control().primary()
    }

    fn projector() -> DisplaySurface {
        DisplaySurface::new(2, 192, 108)
    }

    fn presenter(surfaces: Vec<DisplaySurface>) -> (Presenter, Receiver<SessionEvent>) {
        let (tx, rx) = flume::unbounded();
        let config = PresenterConfig {
            warm_workers: 0,
            ..PresenterConfig::default()
        };
        let presenter = Presenter::new(
            Arc::new(FakeDeck::new(5)),
            laptop(),
            surfaces,
            config,
            tx,
        );
        (presenter, rx)
    }

    fn last_change(rx: &Receiver<SessionEvent>) -> SlideChange {
        rx.try_iter()
            .filter_map(|event| match event {
                SessionEvent::SlideChanged(change) => Some(change),
                SessionEvent::Ended { .. } => None,
            })
            .last()
            .expect("a slide change")
    }

    #[test]
    fn start_uses_review_selection_and_external_display() {
        let (mut presenter, rx) = presenter(vec![laptop(), projector()]);
        presenter.apply(HostCommand::SelectSlide(3)).unwrap();
        presenter.apply(HostCommand::StartPresentation).unwrap();

        let change = last_change(&rx);
        assert_eq!(change.index, 3);
        assert_eq!(change.page.render_size, RenderSize::new(192, 108));
        assert_eq!(
            presenter.session().display_target().unwrap().id,
            SurfaceId(2)
        );
    }

    #[test]
    fn end_resynchronizes_review_selection() {
        let (mut presenter, _rx) = presenter(vec![laptop()]);
        presenter.apply(HostCommand::StartPresentation).unwrap();
        presenter.apply(HostCommand::Next).unwrap();
        presenter.apply(HostCommand::Next).unwrap();
        presenter.apply(HostCommand::EndPresentation).unwrap();

        assert_eq!(presenter.review_index(), 2);
        assert_eq!(presenter.review_page().unwrap().page, 2);
        assert_eq!(
            presenter.review_page().unwrap().render_size,
            RenderSize::new(144, 90)
        );
    }

    #[test]
    fn select_slide_jumps_while_presenting() {
        let (mut presenter, rx) = presenter(vec![laptop()]);
        presenter.apply(HostCommand::StartPresentation).unwrap();
        presenter.apply(HostCommand::SelectSlide(4)).unwrap();

        assert_eq!(last_change(&rx).index, 4);
        assert_eq!(presenter.review_index(), 0);
    }

    #[test]
    fn select_slide_out_of_range_is_rejected() {
        let (mut presenter, _rx) = presenter(vec![laptop()]);
        let err = presenter.apply(HostCommand::SelectSlide(5)).unwrap_err();
        assert!(err.is_out_of_range());
        assert_eq!(presenter.review_index(), 0);
    }

    #[test]
    fn navigation_before_start_is_invalid() {
        let (mut presenter, _rx) = presenter(vec![laptop()]);
        assert!(presenter.apply(HostCommand::Next).unwrap_err().is_invalid_state());
        assert!(
            presenter
                .apply(HostCommand::EndPresentation)
                .unwrap_err()
                .is_invalid_state()
        );
    }

    #[test]
    fn cycle_transition_affects_next_slide() {
        let (mut presenter, rx) = presenter(vec![laptop()]);
        presenter.apply(HostCommand::StartPresentation).unwrap();
        presenter.apply(HostCommand::CycleTransition).unwrap();
        presenter.apply(HostCommand::Next).unwrap();

        assert_eq!(
            last_change(&rx).transition.unwrap().style,
            TransitionStyle::Push
        );
        assert_eq!(presenter.transition_style(), TransitionStyle::Push);
    }

    #[test]
    fn resize_targets_review_when_idle() {
        let (mut presenter, _rx) = presenter(vec![laptop()]);
        presenter
            .apply(HostCommand::Resize(RenderSize::new(64, 40)))
            .unwrap();
        assert_eq!(
            presenter.review_cache().render_size(),
            RenderSize::new(64, 40)
        );
    }

    #[test]
    fn select_display_moves_running_presentation() {
        let (mut presenter, rx) = presenter(vec![laptop(), projector()]);
        presenter.apply(HostCommand::StartPresentation).unwrap();
        last_change(&rx);

        presenter
            .apply(HostCommand::SelectDisplay(DisplayPolicy::Explicit(1)))
            .unwrap();
        assert_eq!(
            presenter.session().display_target().unwrap().id,
            SurfaceId(1)
        );
        let change = last_change(&rx);
        assert!(change.transition.is_none());
        assert_eq!(change.page.render_size, RenderSize::new(144, 90));
    }

    #[test]
    fn unplugging_projector_falls_back_to_control() {
        let (mut presenter, rx) = presenter(vec![laptop(), projector()]);
        presenter.apply(HostCommand::StartPresentation).unwrap();
        last_change(&rx);

        presenter
            .apply(HostCommand::SurfacesChanged {
                surfaces: vec![laptop()],
                control: laptop(),
            })
            .unwrap();

        assert_eq!(
            presenter.session().display_target().unwrap().id,
            SurfaceId(1)
        );
        assert_eq!(
            last_change(&rx).page.render_size,
            RenderSize::new(144, 90)
        );
    }

    #[test]
    fn explicit_target_survives_unrelated_display_changes() {
        let monitor = DisplaySurface::new(3, 256, 144);
        let (mut presenter, rx) = presenter(vec![laptop(), projector(), monitor.clone()]);
        presenter
            .apply(HostCommand::SelectDisplay(DisplayPolicy::Explicit(2)))
            .unwrap();
        presenter.apply(HostCommand::StartPresentation).unwrap();
        last_change(&rx);

        presenter
            .apply(HostCommand::SurfacesChanged {
                surfaces: vec![monitor, laptop(), projector()],
                control: laptop(),
            })
            .unwrap();

        assert_eq!(
            presenter.session().display_target().unwrap().id,
            SurfaceId(2)
        );
        assert!(rx.is_empty());
    }
}
