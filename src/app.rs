//! Terminal host: feeds input to the presenter and session events to a sink

use std::time::Duration;

use anyhow::Result;
use flume::Receiver;
use log::{debug, info, warn};

use crate::event_source::{Event, EventSource};
use crate::export::SlideSink;
use crate::inputs::{KeyAction, KeyMap};
use crate::settings;
use crate::slides::{
    DEFAULT_SURFACE_SIZE, DisplaySurface, HostCommand, Presenter, RenderSize, SessionEvent,
};

/// Pixels covered by one terminal cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// The terminal window as a display surface. Terminals that don't report
/// their pixel size get the default surface size and no cell size.
pub fn measure_terminal() -> (DisplaySurface, Option<CellSize>) {
    match crossterm::terminal::window_size() {
        Ok(size) if size.width > 0 && size.height > 0 && size.columns > 0 && size.rows > 0 => {
            let cell = CellSize {
                width: u32::from(size.width) / u32::from(size.columns),
                height: u32::from(size.height) / u32::from(size.rows),
            };
            let surface = control_surface(RenderSize::new(
                u32::from(size.width),
                u32::from(size.height),
            ));
            (surface, Some(cell))
        }
        Ok(_) => {
            info!("Terminal does not report its pixel size, assuming {DEFAULT_SURFACE_SIZE}");
            (control_surface(DEFAULT_SURFACE_SIZE), None)
        }
        Err(e) => {
            warn!("Failed to query terminal size: {e}");
            (control_surface(DEFAULT_SURFACE_SIZE), None)
        }
    }
}

/// The terminal window: control surface and primary display
pub fn control_surface(size: RenderSize) -> DisplaySurface {
    DisplaySurface::new(1, size.width, size.height)
        .named("terminal")
        .control()
        .primary()
}

pub struct App<S: SlideSink> {
    presenter: Presenter,
    events: Receiver<SessionEvent>,
    keymap: KeyMap,
    sink: S,
    cell_size: Option<CellSize>,
    remember_choices: bool,
}

impl<S: SlideSink> App<S> {
    pub fn new(presenter: Presenter, events: Receiver<SessionEvent>, sink: S) -> Self {
        Self {
            presenter,
            events,
            keymap: KeyMap::new(),
            sink,
            cell_size: None,
            remember_choices: false,
        }
    }

    /// Track terminal resizes using this cell size
    pub fn with_cell_size(mut self, cell_size: Option<CellSize>) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Save transition and display choices made at runtime to the settings file
    pub fn remembering_choices(mut self) -> Self {
        self.remember_choices = true;
        self
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply a host command and forward whatever it produced. Command errors
    /// are reported to the user, not returned; only sink failures are.
    pub fn dispatch(&mut self, cmd: HostCommand) -> Result<()> {
        let selects_review =
            matches!(cmd, HostCommand::SelectSlide(_)) && !self.presenter.session().is_active();
        let picks_transition = matches!(
            cmd,
            HostCommand::SetTransition(_) | HostCommand::CycleTransition
        );
        let picks_display = matches!(cmd, HostCommand::SelectDisplay(_));

        match self.presenter.apply(cmd) {
            Ok(()) => {
                if selects_review {
                    self.show_review()?;
                }
                if self.remember_choices && picks_transition {
                    settings::set_transition(self.presenter.transition_style());
                }
                if self.remember_choices && picks_display {
                    settings::set_display_policy(self.presenter.display_policy());
                }
            }
            Err(e) => {
                warn!("Command failed: {e}");
                self.sink.notice(&e.to_string())?;
            }
        }
        self.flush_events()
    }

    /// Handle one terminal event; returns true when the user asked to quit
    pub fn handle_event(&mut self, event: &Event) -> Result<bool> {
        if let Event::Resize(columns, rows) = event {
            self.resize_control(*columns, *rows)?;
            return Ok(false);
        }

        match self.keymap.handle(event) {
            KeyAction::Command(cmd) => self.dispatch(cmd)?,
            KeyAction::Quit => return Ok(true),
            KeyAction::Pending => debug!("Slide number so far: {}", self.keymap.pending_number()),
            KeyAction::Ignored => {}
        }
        Ok(false)
    }

    /// Forward queued session events to the sink and log finished warm batches
    pub fn flush_events(&mut self) -> Result<()> {
        let events: Vec<SessionEvent> = self.events.try_iter().collect();
        for event in events {
            match event {
                SessionEvent::SlideChanged(change) => {
                    self.sink
                        .slide_changed(&change, self.presenter.page_count())?;
                }
                SessionEvent::Ended { last_index } => {
                    self.sink.notice(&format!(
                        "presentation ended at slide {}",
                        last_index + 1
                    ))?;
                    self.show_review()?;
                }
            }
        }

        if let Some(pool) = self.presenter.session().warm_pool() {
            for response in pool.poll_responses() {
                debug!("Warm batch {:?} finished", response.id());
            }
        }
        Ok(())
    }

    fn show_review(&mut self) -> Result<()> {
        match self.presenter.review_page() {
            Ok(page) => self.sink.review_changed(&page, self.presenter.page_count()),
            Err(e) => {
                warn!("Review slide unavailable: {e}");
                self.sink.notice(&e.to_string())
            }
        }
    }

    fn resize_control(&mut self, columns: u16, rows: u16) -> Result<()> {
        let Some(cell) = self.cell_size else {
            debug!("Terminal resized to {columns}x{rows} cells, pixel size unknown");
            return Ok(());
        };

        let mut control = self.presenter.control_surface().clone();
        control.frame.width = u32::from(columns) * cell.width;
        control.frame.height = u32::from(rows) * cell.height;
        if &control == self.presenter.control_surface() {
            return Ok(());
        }

        let surfaces = self
            .presenter
            .surfaces()
            .iter()
            .map(|s| {
                if s.id == control.id {
                    control.clone()
                } else {
                    s.clone()
                }
            })
            .collect();
        self.dispatch(HostCommand::SurfacesChanged { surfaces, control })
    }
}

pub fn run_app_with_event_source<S: SlideSink>(
    app: &mut App<S>,
    event_source: &mut dyn EventSource,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    loop {
        if event_source.poll(tick_rate)? {
            let event = event_source.read()?;
            if app.handle_event(&event)? {
                info!("Quit requested");
                return Ok(());
            }
        }
        app.flush_events()?;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;
    use crate::settings::Settings;
    use crate::slides::{DisplayPolicy, PresenterConfig, TransitionStyle};
    use crate::test_utils::test_helpers::TestScenarioBuilder;
    use crate::test_utils::{FakeDeck, RecordingSink};

    fn app(pages: usize, cell_size: Option<CellSize>) -> App<RecordingSink> {
        let (tx, rx) = flume::unbounded();
        let config = PresenterConfig {
            warm_workers: 0,
            ..PresenterConfig::default()
        };
        let control = control_surface(RenderSize::new(160, 90));
        let presenter = Presenter::new(
            Arc::new(FakeDeck::new(pages)),
            control.clone(),
            vec![control],
            config,
            tx,
        );
        App::new(presenter, rx, RecordingSink::default()).with_cell_size(cell_size)
    }

    #[test]
    fn keys_drive_the_presentation() {
        let mut app = app(5, None);
        let mut input = TestScenarioBuilder::new()
            .start()
            .next(2)
            .press_char('t')
            .previous(1)
            .click()
            .end()
            .build();

        run_app_with_event_source(&mut app, &mut input).unwrap();

        let sink = app.sink();
        assert_eq!(sink.shown_indices(), vec![0, 1, 2, 1, 2]);
        assert_eq!(sink.slides[0].transition, None);
        assert_eq!(sink.slides[2].transition, Some(TransitionStyle::Fade));
        assert_eq!(sink.slides[3].transition, Some(TransitionStyle::Push));
        assert_eq!(sink.reviews, vec![2]);
        assert_eq!(sink.notices, vec!["presentation ended at slide 3"]);
    }

    #[test]
    fn typed_number_selects_review_slide_when_idle() {
        let mut app = app(5, None);
        let mut input = TestScenarioBuilder::new().go_to(4).start().build();

        run_app_with_event_source(&mut app, &mut input).unwrap();

        assert_eq!(app.sink().reviews, vec![3]);
        assert_eq!(app.sink().shown_indices(), vec![3]);
    }

    #[test]
    fn command_errors_become_notices() {
        let mut app = app(3, None);
        let mut input = TestScenarioBuilder::new().next(1).go_to(9).build();

        run_app_with_event_source(&mut app, &mut input).unwrap();

        let notices = &app.sink().notices;
        assert_eq!(notices.len(), 2);
        assert!(notices[0].contains("inactive"));
        assert!(notices[1].contains("out of range"));
        assert!(app.sink().slides.is_empty());
    }

    #[test]
    fn terminal_resize_rerenders_presentation() {
        let cell = CellSize {
            width: 8,
            height: 16,
        };
        let mut app = app(3, Some(cell));
        let mut input = TestScenarioBuilder::new().start().resize(40, 10).build();

        run_app_with_event_source(&mut app, &mut input).unwrap();

        let sizes: Vec<RenderSize> = app.sink().slides.iter().map(|s| s.render_size).collect();
        assert_eq!(
            sizes,
            vec![RenderSize::new(160, 90), RenderSize::new(320, 160)]
        );
        assert_eq!(
            app.presenter().control_surface().render_size(),
            RenderSize::new(320, 160)
        );
    }

    #[test]
    fn resize_without_cell_size_is_ignored() {
        let mut app = app(3, None);
        assert!(!app.handle_event(&Event::Resize(40, 10)).unwrap());
        assert_eq!(
            app.presenter().control_surface().render_size(),
            RenderSize::new(160, 90)
        );
    }

    #[test]
    #[serial]
    fn runtime_choices_are_saved_when_remembering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        settings::replace_settings(Settings::default());
        settings::load_settings_from(&path);

        let mut app = app(3, None).remembering_choices();
        app.dispatch(HostCommand::CycleTransition).unwrap();
        app.dispatch(HostCommand::SelectDisplay(DisplayPolicy::Explicit(1)))
            .unwrap();

        let saved: Settings =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.transition, TransitionStyle::Push);
        assert_eq!(saved.display_policy, DisplayPolicy::Explicit(1));
        settings::replace_settings(Settings::default());
    }

    #[test]
    #[serial]
    fn runtime_choices_stay_in_memory_by_default() {
        settings::replace_settings(Settings::default());

        let mut app = app(3, None);
        app.dispatch(HostCommand::CycleTransition).unwrap();

        assert_eq!(app.presenter().transition_style(), TransitionStyle::Push);
        assert_eq!(settings::get_transition(), TransitionStyle::default());
    }
}
