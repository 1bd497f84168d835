pub mod app;
pub mod event_source;
pub mod export;
pub mod inputs;
pub mod panic_handler;
pub mod settings;
pub mod slides;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, run_app_with_event_source};
pub use slides::{HostCommand, PageSource, PresentationSession, Presenter, SessionEvent};
