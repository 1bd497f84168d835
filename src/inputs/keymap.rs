//! Terminal keys and clicks to host commands

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};

use super::slide_number::SlideNumberInput;
use crate::slides::HostCommand;

/// What the app loop should do with one terminal event
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Command(HostCommand),
    Quit,
    /// Part of a slide number, nothing to do yet
    Pending,
    Ignored,
}

#[derive(Debug, Default)]
pub struct KeyMap {
    number: SlideNumberInput,
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &Event) -> KeyAction {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => KeyAction::Command(HostCommand::Next),
                _ => KeyAction::Ignored,
            },
            _ => KeyAction::Ignored,
        }
    }

    /// Digits typed so far
    pub fn pending_number(&self) -> &str {
        self.number.pending()
    }

    fn handle_key(&mut self, key: &KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => KeyAction::Quit,
                _ => KeyAction::Ignored,
            };
        }

        if let KeyCode::Char(c) = key.code {
            if self.number.push(c) {
                return KeyAction::Pending;
            }
        }

        let command = match key.code {
            KeyCode::Char('g') | KeyCode::Enter if !self.number.is_empty() => {
                return match self.number.take() {
                    Some(index) => KeyAction::Command(HostCommand::SelectSlide(index)),
                    None => KeyAction::Ignored,
                };
            }
            KeyCode::Left | KeyCode::Up | KeyCode::PageUp | KeyCode::Backspace => {
                HostCommand::Previous
            }
            KeyCode::Right
            | KeyCode::Down
            | KeyCode::PageDown
            | KeyCode::Char(' ')
            | KeyCode::Enter => HostCommand::Next,
            KeyCode::Esc => HostCommand::EndPresentation,
            KeyCode::Char('t' | 'T') => HostCommand::CycleTransition,
            KeyCode::Char('r') => HostCommand::Refresh,
            KeyCode::Char('s') => HostCommand::StartPresentation,
            KeyCode::Char('q') => return KeyAction::Quit,
            _ => return KeyAction::Ignored,
        };

        self.number.clear();
        KeyAction::Command(command)
    }
}
