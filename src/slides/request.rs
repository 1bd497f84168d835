//! Warm request and response types

use std::sync::Arc;

use super::cache::{PageImageCache, WarmReport};

/// Unique identifier for warm requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to warm workers
pub enum WarmRequest {
    /// Pre-render pages into a cache
    Warm {
        id: RequestId,
        cache: Arc<PageImageCache>,
        pages: Vec<usize>,
        /// Cache generation when the batch was scheduled
        generation: u64,
    },

    /// Shutdown the worker
    Shutdown,
}

impl std::fmt::Debug for WarmRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warm {
                id,
                pages,
                generation,
                ..
            } => f
                .debug_struct("Warm")
                .field("id", id)
                .field("pages", pages)
                .field("generation", generation)
                .finish_non_exhaustive(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Response from warm workers
#[derive(Debug)]
pub enum WarmResponse {
    /// A batch ran to completion or was abandoned after an invalidation
    Finished { id: RequestId, report: WarmReport },
}

impl WarmResponse {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Finished { id, .. } => *id,
        }
    }
}
