//! Pipeline stages for fetching page images and binding them into a PDF.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the network and pdfium sit behind traits the orchestrator
//! can swap out.
//!
//! ## Data Flow
//!
//! ```text
//! template ──▶ schedule ──▶ fetch (× batch) ──▶ assemble
//! (sample URL)  (batches)    (HTTP GET)          (pdfium)
//! ```
//!
//! 1. [`template`] — split the sample URL into prefix / index / suffix
//! 2. [`schedule`] — walk the page range in concurrent batches, tracking the
//!    consecutive-failure budget; the only stage with non-trivial control flow
//! 3. [`fetch`]    — one GET per page, every fault turned into a
//!    [`fetch::FetchOutcome::Failure`]
//! 4. [`assemble`] — decode the collected images and lay them out one per
//!    page; runs in `spawn_blocking` because pdfium is not async-safe

pub mod assemble;
pub mod fetch;
pub mod schedule;
pub mod template;
