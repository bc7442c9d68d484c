//! Progress-callback trait for batch and page fetch events.
//!
//! Inject an [`Arc<dyn FetchProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the scheduler dispatches batches and pages complete.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pages2pdf::{FetchProgressCallback, RunConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     fetched: AtomicUsize,
//! }
//!
//! impl FetchProgressCallback for CountingCallback {
//!     fn on_page_fetched(&self, page: u32, success: bool) {
//!         if success {
//!             self.fetched.fetch_add(1, Ordering::SeqCst);
//!         }
//!         eprintln!("page {page}: {}", if success { "ok" } else { "failed" });
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { fetched: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder("https://example.com/scan_0000.jpg", "scan")
//!     .progress_callback(counter as Arc<dyn FetchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::StopReason;
use std::sync::Arc;

/// Called by the scheduler and orchestrator as a run progresses.
///
/// `on_page_fetched` fires from inside a batch's concurrent fetches, so it
/// arrives in completion order and may be called from several tasks at
/// once; every other method is called from the single scheduler flow.
/// All methods default to no-ops.
pub trait FetchProgressCallback: Send + Sync {
    /// Called once before the first batch.
    ///
    /// `total_pages` is `None` when the end page is unbounded.
    fn on_run_start(&self, total_pages: Option<usize>) {
        let _ = total_pages;
    }

    /// Called when a batch of `len` pages is dispatched (`batch` is 1-indexed).
    fn on_batch_start(&self, batch: usize, len: usize) {
        let _ = (batch, len);
    }

    /// Called as each page fetch finishes.
    fn on_page_fetched(&self, page: u32, success: bool) {
        let _ = (page, success);
    }

    /// Called after a batch has been reduced.
    fn on_batch_complete(&self, batch: usize, succeeded: usize, dispatched: usize) {
        let _ = (batch, succeeded, dispatched);
    }

    /// Called once the scheduler reaches a terminal state.
    fn on_run_complete(&self, collected: usize, reason: StopReason) {
        let _ = (collected, reason);
    }

    /// Called just before the collected pages are bound into a document.
    fn on_assemble_start(&self, pages: usize) {
        let _ = pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl FetchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn FetchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        batches: AtomicUsize,
        fetched: AtomicUsize,
        failed: AtomicUsize,
        collected: AtomicUsize,
    }

    impl FetchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, _batch: usize, _len: usize) {
            self.batches.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_fetched(&self, _page: u32, success: bool) {
            if success {
                self.fetched.fetch_add(1, Ordering::SeqCst);
            } else {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_run_complete(&self, collected: usize, _reason: StopReason) {
            self.collected.store(collected, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(None);
        cb.on_batch_start(1, 4);
        cb.on_page_fetched(0, true);
        cb.on_batch_complete(1, 3, 4);
        cb.on_run_complete(3, StopReason::RangeExhausted);
        cb.on_assemble_start(3);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(1, 3);
        tracker.on_page_fetched(0, true);
        tracker.on_page_fetched(2, true);
        tracker.on_page_fetched(1, false);
        tracker.on_run_complete(2, StopReason::FailureBudgetExhausted);

        assert_eq!(tracker.batches.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.fetched.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.collected.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(Some(10));
        cb.on_page_fetched(1, false);
    }
}
