//! Batch scheduling: walk the page range in concurrent batches until the
//! range or the consecutive-failure budget runs out.
//!
//! ## One batch
//!
//! ```text
//!  cursor ─┬─▶ url(cursor)     ─┐
//!          ├─▶ url(cursor + 1) ─┤  fan-out (all in flight at once)
//!          └─▶ url(cursor + n) ─┘
//!                               │  fan-in barrier
//!                               ▼
//!          reduce outcomes in dispatch order
//!          Success → keep image, failures = 0
//!          Failure → failures += 1, stop if failures ≥ budget
//! ```
//!
//! Outcomes are reduced in page order, never completion order, so the
//! collected images and the point where the budget trips are the same for
//! every batch size and every network timing. Batch *n + 1* is only
//! dispatched once batch *n* has fully fanned in, which caps in-flight
//! requests at the batch size.

use crate::config::{BatchSize, PageBound, RunConfig};
use crate::output::{FetchedPage, StopReason};
use crate::pipeline::fetch::{FetchOutcome, PageFetcher};
use crate::pipeline::template::UrlTemplate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Mutable state of one run, owned by [`schedule`].
#[derive(Debug, Default)]
pub struct RunState {
    /// Next page index to dispatch.
    pub cursor: u32,
    pub consecutive_failures: u32,
    /// Successful pages in ascending page order.
    pub collected: Vec<FetchedPage>,
}

/// Everything the scheduler hands back to the orchestrator.
#[derive(Debug)]
pub struct ScheduleOutcome {
    pub pages: Vec<FetchedPage>,
    pub stop_reason: StopReason,
    pub batches: usize,
    pub attempted: usize,
    pub failed: usize,
}

/// Scheduler parameters, lifted out of [`RunConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SchedulePlan {
    pub start_page: u32,
    pub end_page: PageBound,
    pub max_consecutive_failures: u32,
    pub batch_size: BatchSize,
    pub scale: Option<u32>,
    pub rotate: Option<u32>,
}

impl From<&RunConfig> for SchedulePlan {
    fn from(c: &RunConfig) -> Self {
        Self {
            start_page: c.start_page,
            end_page: c.end_page,
            max_consecutive_failures: c.max_consecutive_failures,
            batch_size: c.batch_size,
            scale: c.scale,
            rotate: c.rotate,
        }
    }
}

impl SchedulePlan {
    /// Pages the next batch may dispatch when the cursor sits at `cursor`.
    ///
    /// Callers only ask while `cursor` is in range, so the bounded
    /// remainder is at least 1.
    pub fn batch_limit(&self, cursor: u32) -> usize {
        let remaining = match self.end_page {
            PageBound::Bounded(end) => Some(end.saturating_sub(cursor) as usize + 1),
            PageBound::Unbounded => None,
        };
        match (self.batch_size, remaining) {
            (BatchSize::Fixed(n), Some(r)) => n.min(r),
            (BatchSize::Fixed(n), None) => n,
            (BatchSize::WholeRange, Some(r)) => r,
            // An unbounded range has no "whole"; a window of one budget's
            // worth of pages can still trip the budget inside one batch.
            (BatchSize::WholeRange, None) => self.max_consecutive_failures.max(1) as usize,
        }
    }
}

/// Run batches until a terminal state is reached.
pub async fn schedule<F: PageFetcher>(
    template: &UrlTemplate,
    plan: &SchedulePlan,
    fetcher: &F,
    config: &RunConfig,
) -> ScheduleOutcome {
    let cb = config.progress_callback.as_ref();
    let mut state = RunState {
        cursor: plan.start_page,
        ..RunState::default()
    };
    let mut batches = 0usize;
    let mut attempted = 0usize;
    let mut failed = 0usize;

    let stop_reason = loop {
        if !plan.end_page.contains(state.cursor) {
            break StopReason::RangeExhausted;
        }

        let limit = plan.batch_limit(state.cursor).max(1);
        let pages: Vec<u32> = (0..limit as u32)
            .map_while(|offset| state.cursor.checked_add(offset))
            .take_while(|p| plan.end_page.contains(*p))
            .collect();
        let dispatched = pages.len();
        batches += 1;
        attempted += dispatched;

        debug!(
            "Batch {}: pages {}..={} ({} requests)",
            batches,
            state.cursor,
            state.cursor as usize + dispatched - 1,
            dispatched
        );
        if let Some(cb) = cb {
            cb.on_batch_start(batches, dispatched);
        }

        // `buffered` yields in dispatch order while running all of them at once.
        let outcomes: Vec<(u32, FetchOutcome)> = stream::iter(pages.into_iter().map(|page| {
            let url = template.url_for(page, plan.scale, plan.rotate);
            async move {
                let outcome = fetcher.fetch_page(page, &url).await;
                if let Some(cb) = cb {
                    cb.on_page_fetched(page, outcome.is_success());
                }
                (page, outcome)
            }
        }))
        .buffered(dispatched.max(1))
        .collect()
        .await;

        // Advanced regardless of outcome; `None` means the index space is spent.
        let next_cursor = state.cursor.checked_add(dispatched as u32);
        state.cursor = next_cursor.unwrap_or(u32::MAX);

        let mut succeeded = 0usize;
        let mut budget_exhausted = false;
        for (page, outcome) in outcomes {
            match outcome {
                FetchOutcome::Success(bytes) => {
                    state.collected.push(FetchedPage { index: page, bytes });
                    state.consecutive_failures = 0;
                    succeeded += 1;
                }
                FetchOutcome::Failure(_) => {
                    state.consecutive_failures += 1;
                    failed += 1;
                }
            }
            if state.consecutive_failures >= plan.max_consecutive_failures {
                budget_exhausted = true;
                break;
            }
        }

        info!(
            "Batch {} completed: {}/{} pages downloaded.",
            batches, succeeded, dispatched
        );
        if let Some(cb) = cb {
            cb.on_batch_complete(batches, succeeded, dispatched);
        }

        if budget_exhausted {
            warn!(
                "Stopping due to {} consecutive failures.",
                plan.max_consecutive_failures
            );
            break StopReason::FailureBudgetExhausted;
        }
        if next_cursor.is_none() {
            break StopReason::RangeExhausted;
        }
    };

    info!(
        "Fetch finished ({}): {} pages collected in {} batches",
        stop_reason,
        state.collected.len(),
        batches
    );
    if let Some(cb) = cb {
        cb.on_run_complete(state.collected.len(), stop_reason);
    }

    ScheduleOutcome {
        pages: state.collected,
        stop_reason,
        batches,
        attempted,
        failed,
    }
}
