//! Background warm workers - pre-render neighbouring slides off the
//! presenting thread

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::cache::PageImageCache;
use super::request::{RequestId, WarmRequest, WarmResponse};

/// Fixed pool of threads pulling warm batches from one shared queue
pub struct WarmPool {
    request_tx: Sender<WarmRequest>,
    response_rx: Receiver<WarmResponse>,
    num_workers: usize,
    next_request_id: u64,
}

impl WarmPool {
    /// Spawn `num_workers` warm threads (at least one)
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        // flume channels are MPMC: every worker clones the same request
        // receiver and pulls from the shared queue.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let num_workers = num_workers.max(1);

        for n in 0..num_workers {
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("slide-warm-{n}"))
                .spawn(move || warm_worker(rx, tx));
            if let Err(e) = spawned {
                warn!("Failed to spawn warm worker {n}: {e}");
            }
        }

        Self {
            request_tx,
            response_rx,
            num_workers,
            next_request_id: 1,
        }
    }

    /// Queue `pages` to be rendered into `cache`. Fire-and-forget.
    pub fn schedule(&mut self, cache: &Arc<PageImageCache>, pages: Vec<usize>) -> RequestId {
        let id = self.next_id();
        let generation = cache.generation();

        debug!("Scheduling warm {id:?} for pages {pages:?} (generation {generation})");
        let request = WarmRequest::Warm {
            id,
            cache: Arc::clone(cache),
            pages,
            generation,
        };
        if self.request_tx.send(request).is_err() {
            warn!("Warm workers are gone, dropping {id:?}");
        }

        id
    }

    /// Drain finished warm batches without blocking
    pub fn poll_responses(&self) -> Vec<WarmResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Get the response receiver for blocking or async usage
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<WarmResponse> {
        &self.response_rx
    }

    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Shutdown all workers. Batches already queued ahead of the shutdown
    /// requests still run.
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(WarmRequest::Shutdown);
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for WarmPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WarmPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmPool")
            .field("num_workers", &self.num_workers)
            .field("queued", &self.request_tx.len())
            .finish_non_exhaustive()
    }
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
fn warm_worker(requests: Receiver<WarmRequest>, responses: Sender<WarmResponse>) {
    for request in requests {
        match request {
            WarmRequest::Warm {
                id,
                cache,
                pages,
                generation,
            } => {
                let report = cache.warm_for_generation(&pages, generation);
                for (page, err) in &report.failed {
                    warn!("Warming page {page} failed: {err}");
                }
                if report.abandoned {
                    debug!("Warm {id:?} abandoned, cache was invalidated");
                }
                let _ = responses.send(WarmResponse::Finished { id, report });
            }
            WarmRequest::Shutdown => break,
        }
    }
}
