//! Fakes and builders shared by unit and integration tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::export::SlideSink;
use crate::slides::{
    DecodeError, PageSource, RasterImage, RenderSize, RenderedPage, SlideChange, TransitionStyle,
};

/// In-memory deck of 16:9 slides that counts every render
pub struct FakeDeck {
    renders: Vec<AtomicUsize>,
    failing: HashSet<usize>,
    delay: Option<Duration>,
}

impl FakeDeck {
    pub fn new(page_count: usize) -> Self {
        Self {
            renders: (0..page_count).map(|_| AtomicUsize::new(0)).collect(),
            failing: HashSet::new(),
            delay: None,
        }
    }

    /// Make every render of `page` fail to decode
    pub fn failing_on(mut self, page: usize) -> Self {
        self.failing.insert(page);
        self
    }

    /// Sleep before each render, to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Render attempts for one page
    pub fn render_count(&self, page: usize) -> usize {
        self.renders
            .get(page)
            .map_or(0, |count| count.load(Ordering::SeqCst))
    }

    pub fn total_renders(&self) -> usize {
        self.renders.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Colour a page is filled with
    pub fn color_of(page: usize) -> [u8; 3] {
        [(page * 40 % 256) as u8, 90, 200]
    }
}

impl PageSource for FakeDeck {
    fn page_count(&self) -> usize {
        self.renders.len()
    }

    fn render(&self, page: usize, size: RenderSize) -> Result<RasterImage, DecodeError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let Some(count) = self.renders.get(page) else {
            return Err(DecodeError::new(page, "no such page"));
        };
        count.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&page) {
            return Err(DecodeError::new(page, "simulated decode failure"));
        }
        let fitted = size.fit(16.0, 9.0);
        Ok(RasterImage::filled(
            fitted.width,
            fitted.height,
            Self::color_of(page),
        ))
    }
}

/// One slide as the sink saw it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShownSlide {
    pub index: usize,
    /// `None` for a cut
    pub transition: Option<TransitionStyle>,
    pub render_size: RenderSize,
}

/// Sink that remembers everything instead of writing files
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub slides: Vec<ShownSlide>,
    pub reviews: Vec<usize>,
    pub notices: Vec<String>,
}

impl RecordingSink {
    pub fn shown_indices(&self) -> Vec<usize> {
        self.slides.iter().map(|s| s.index).collect()
    }
}

impl SlideSink for RecordingSink {
    fn slide_changed(&mut self, change: &SlideChange, _page_count: usize) -> Result<()> {
        self.slides.push(ShownSlide {
            index: change.index,
            transition: change.transition.map(|t| t.style),
            render_size: change.page.render_size,
        });
        Ok(())
    }

    fn review_changed(&mut self, page: &RenderedPage, _page_count: usize) -> Result<()> {
        self.reviews.push(page.page);
        Ok(())
    }

    fn notice(&mut self, message: &str) -> Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}

pub mod test_helpers {
    use crossterm::event::{KeyEventKind, KeyEventState, MouseButton};

    use crate::event_source::{Event, KeyCode, KeyEvent, KeyModifiers, SimulatedEventSource};
    use crate::slides::DisplaySurface;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events.push(Event::Key(KeyEvent {
                code,
                modifiers: KeyModifiers::empty(),
                kind: KeyEventKind::Press,
                state: KeyEventState::empty(),
            }));
            self
        }

        /// Begin presenting (press 's')
        pub fn start(self) -> Self {
            self.press_char('s')
        }

        /// Advance n slides with the right arrow
        pub fn next(mut self, times: usize) -> Self {
            for _ in 0..times {
                self = self.press(KeyCode::Right);
            }
            self
        }

        /// Go back n slides with the left arrow
        pub fn previous(mut self, times: usize) -> Self {
            for _ in 0..times {
                self = self.press(KeyCode::Left);
            }
            self
        }

        /// Type a 1-based slide number and confirm with 'g'
        pub fn go_to(mut self, slide: usize) -> Self {
            for c in slide.to_string().chars() {
                self = self.press_char(c);
            }
            self.press_char('g')
        }

        pub fn click(mut self) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_down(MouseButton::Left, 10, 5));
            self
        }

        pub fn resize(mut self, columns: u16, rows: u16) -> Self {
            self.events.push(Event::Resize(columns, rows));
            self
        }

        /// End presenting (Esc)
        pub fn end(self) -> Self {
            self.press(KeyCode::Esc)
        }

        /// Quit the application (press 'q')
        pub fn quit(self) -> Self {
            self.press_char('q')
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Control surface of a laptop-sized test setup
    pub fn control_surface(width: u32, height: u32) -> DisplaySurface {
        DisplaySurface::new(1, width, height)
            .named("built-in")
            .control()
            .primary()
    }

    /// A second, external surface
    pub fn external_surface(width: u32, height: u32) -> DisplaySurface {
        DisplaySurface::new(2, width, height).named("external")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .start()
            .next(2)
            .go_to(12)
            .click()
            .end()
            .quit()
            .build();

        // s, 2 arrows, '1' '2' 'g', click, esc, q
        assert_eq!(scenario.events.len(), 9);
    }

    #[test]
    fn fake_deck_counts_and_fails() {
        let deck = FakeDeck::new(2).failing_on(1);
        let image = deck.render(0, RenderSize::new(32, 32)).unwrap();
        assert_eq!(image.size(), RenderSize::new(32, 18));
        assert!(deck.render(1, RenderSize::new(32, 32)).is_err());
        assert!(deck.render(2, RenderSize::new(32, 32)).is_err());
        assert_eq!(deck.total_renders(), 2);
    }
}
