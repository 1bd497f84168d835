//! Error types for the slide engine

use std::path::PathBuf;

use super::session::Lifecycle;

/// A page source failed to rasterize a page
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("failed to render page {page}: {detail}")]
pub struct DecodeError {
    pub page: usize,
    pub detail: String,
}

impl DecodeError {
    pub fn new(page: usize, detail: impl Into<String>) -> Self {
        Self {
            page,
            detail: detail.into(),
        }
    }
}

/// Errors from cache and session operations.
///
/// None of these are fatal; each is scoped to the operation that raised it.
#[derive(Debug, thiserror::Error)]
pub enum SlideError {
    #[error("slide {index} is out of range (document has {page_count} pages)")]
    OutOfRange { index: usize, page_count: usize },

    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: Lifecycle,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl SlideError {
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Errors from opening a document as a page source
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("{0:?} does not exist")]
    NotFound(PathBuf),

    #[error("{0:?} is not a supported document (expected a PDF file or an image directory)")]
    Unsupported(PathBuf),

    #[error("{0:?} contains no pages")]
    Empty(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_converts_into_slide_error() {
        let err: SlideError = DecodeError::new(3, "corrupt stream").into();
        assert!(matches!(err, SlideError::Decode(ref e) if e.page == 3));
        assert_eq!(err.to_string(), "failed to render page 3: corrupt stream");
    }

    #[test]
    fn invalid_state_message_names_operation() {
        let err = SlideError::InvalidState {
            operation: "advance",
            state: Lifecycle::Inactive,
        };
        assert!(err.is_invalid_state());
        assert_eq!(
            err.to_string(),
            "cannot advance while the session is inactive"
        );
    }
}
