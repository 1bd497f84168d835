//! Slide rendering and presentation

mod cache;
mod command;
mod display;
mod error;
mod image_dir;
#[cfg(feature = "pdf")]
mod pdf_source;
mod presenter;
mod request;
mod session;
mod source;
mod transition;
mod types;
mod worker;

pub use cache::{PageImageCache, WarmReport, neighbors};
pub use command::HostCommand;
pub use display::{
    DisplayPolicy, DisplaySurface, InvalidPolicy, SurfaceFrame, SurfaceId, resolve,
};
pub use error::{DecodeError, OpenError, SlideError};
pub use image_dir::ImageDirSource;
#[cfg(feature = "pdf")]
pub use pdf_source::PdfSource;
pub use presenter::{Presenter, PresenterConfig};
pub use request::{RequestId, WarmRequest, WarmResponse};
pub use session::{Lifecycle, PresentationSession, SessionEvent, SlideChange};
pub use source::{PageSource, open_source};
pub use transition::{
    Direction, Edge, TRANSITION_DURATION, Timing, TransitionDescriptor, TransitionStyle,
    UnknownStyle, describe,
};
pub use types::*;
pub use worker::WarmPool;

/// Slides pre-rendered on each side of the current one
pub const DEFAULT_WARM_RADIUS: usize = 1;

/// Background warm threads per presentation
pub const DEFAULT_WARM_WORKERS: usize = 2;

/// Surface size used when the host cannot report one
pub const DEFAULT_SURFACE_SIZE: RenderSize = RenderSize::new(1920, 1080);
