use std::time::Duration;

use anyhow::Result;
pub use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Where the presenter loop gets terminal input from
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Live terminal input through crossterm
pub struct TerminalEventSource;

impl EventSource for TerminalEventSource {
    fn poll(&mut self, timeout: Duration) -> Result<bool> {
        Ok(crossterm::event::poll(timeout)?)
    }

    fn read(&mut self) -> Result<Event> {
        Ok(crossterm::event::read()?)
    }
}

/// Replays a fixed list of events, then keeps answering `q` so a driven
/// loop always terminates
pub struct SimulatedEventSource {
    pub(crate) events: Vec<Event>,
    current_index: usize,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    pub fn key_event(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: crossterm::event::KeyEventKind::Press,
            state: crossterm::event::KeyEventState::empty(),
        })
    }

    pub fn char_key(c: char) -> Event {
        Self::key_event(KeyCode::Char(c), KeyModifiers::empty())
    }

    /// Mouse button press at a terminal cell
    pub fn mouse_down(button: MouseButton, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(button),
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    /// Events not yet read
    pub fn remaining(&self) -> usize {
        self.events.len() - self.current_index
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }

    fn read(&mut self) -> Result<Event> {
        match self.events.get(self.current_index) {
            Some(event) => {
                self.current_index += 1;
                Ok(event.clone())
            }
            None => Ok(Self::char_key('q')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_source_replays_in_order() {
        let events = vec![
            SimulatedEventSource::char_key('s'),
            SimulatedEventSource::mouse_down(MouseButton::Left, 3, 4),
            Event::Resize(100, 40),
        ];
        let mut source = SimulatedEventSource::new(events);

        assert!(source.poll(Duration::from_millis(0)).unwrap());
        assert!(matches!(
            source.read().unwrap(),
            Event::Key(KeyEvent { code: KeyCode::Char('s'), .. })
        ));
        assert!(matches!(
            source.read().unwrap(),
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column: 3,
                row: 4,
                ..
            })
        ));
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.read().unwrap(), Event::Resize(100, 40));

        assert_eq!(source.remaining(), 0);
        assert!(source.poll(Duration::from_millis(0)).unwrap());
        assert_eq!(source.read().unwrap(), SimulatedEventSource::char_key('q'));
    }
}
