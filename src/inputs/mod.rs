pub mod keymap;
pub mod slide_number;

pub use keymap::{KeyAction, KeyMap};
pub use slide_number::SlideNumberInput;
