//! Commands the host sends to the presenter

use super::display::{DisplayPolicy, DisplaySurface};
use super::transition::TransitionStyle;
use super::types::RenderSize;

/// Discrete host input, already decoupled from keys, clicks and gestures
#[derive(Clone, Debug, PartialEq)]
pub enum HostCommand {
    /// Next slide
    Next,
    /// Previous slide
    Previous,
    /// Show a specific slide (0-indexed)
    JumpTo(usize),
    /// Choose the transition style for subsequent slide changes
    SetTransition(TransitionStyle),
    /// Switch to the following transition style
    CycleTransition,
    /// The surface currently showing slides changed size
    Resize(RenderSize),
    /// Choose how the presentation display is picked
    SelectDisplay(DisplayPolicy),
    /// Begin presenting from the review selection
    StartPresentation,
    /// Stop presenting
    EndPresentation,
    /// Re-show the current slide at the current size
    Refresh,
    /// Thumbnail selection: moves the review selection, or jumps while
    /// presenting
    SelectSlide(usize),
    /// The physical display configuration changed
    SurfacesChanged {
        surfaces: Vec<DisplaySurface>,
        control: DisplaySurface,
    },
}
