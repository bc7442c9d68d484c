//! Run orchestration: template → scheduler → (maybe) assembler → file.
//!
//! Only two things can abort a run: a sample URL that cannot be templated
//! (before any request is sent) and an assembly failure (after all fetching
//! is done). Page fetch failures are absorbed by the scheduler, and a run
//! that collects no pages at all is reported in [`RunOutput`] without
//! writing a document.

use crate::config::{PageBound, RunConfig};
use crate::error::Pages2PdfError;
use crate::output::{RunOutput, RunStats};
use crate::pipeline::assemble::{self, DocumentAssembler, PdfiumAssembler};
use crate::pipeline::fetch::{HttpFetcher, PageFetcher};
use crate::pipeline::schedule::{self, SchedulePlan};
use crate::pipeline::template::UrlTemplate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Fetch every page described by `config` and bind them into a PDF.
///
/// This is the primary entry point for the library: it uses
/// [`HttpFetcher`] for the network and [`PdfiumAssembler`] for the
/// document, and writes the result to [`RunConfig::output_path`].
///
/// # Returns
/// `Ok(RunOutput)` whenever fetching ran to a terminal state, including runs
/// where every page failed (`output.document_path` is then `None`).
///
/// # Errors
/// - [`Pages2PdfError::MalformedUrl`] — nothing was fetched
/// - [`Pages2PdfError::ImageDecode`] and other assembly/write errors — no
///   file was written
pub async fn download_to_pdf(config: &RunConfig) -> Result<RunOutput, Pages2PdfError> {
    let fetcher = HttpFetcher::new(config.fetch_timeout_secs)?;
    let assembler: Arc<dyn DocumentAssembler> = Arc::new(PdfiumAssembler::new());
    run_with(config, &fetcher, assembler).await
}

/// Synchronous wrapper around [`download_to_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn download_to_pdf_sync(config: &RunConfig) -> Result<RunOutput, Pages2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pages2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(download_to_pdf(config))
}

/// Orchestrate a run with caller-supplied fetcher and assembler.
pub async fn run_with<F: PageFetcher>(
    config: &RunConfig,
    fetcher: &F,
    assembler: Arc<dyn DocumentAssembler>,
) -> Result<RunOutput, Pages2PdfError> {
    let total_start = Instant::now();

    // ── Step 1: Template the sample URL ──────────────────────────────────
    let template = UrlTemplate::derive(&config.sample_url)?;
    info!(
        "Fetching pages {}..{} from {}NNNN{}",
        config.start_page,
        match config.end_page {
            PageBound::Bounded(end) => format!("={end}"),
            PageBound::Unbounded => String::new(),
        },
        template.prefix,
        template.suffix
    );

    // ── Step 2: Fetch in batches ─────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(config.total_pages());
    }
    let fetch_start = Instant::now();
    let plan = SchedulePlan::from(config);
    let outcome = schedule::schedule(&template, &plan, fetcher, config).await;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    let mut stats = RunStats {
        pages_attempted: outcome.attempted,
        pages_collected: outcome.pages.len(),
        pages_failed: outcome.failed,
        batches: outcome.batches,
        fetch_duration_ms,
        ..RunStats::default()
    };
    let pages: Vec<u32> = outcome.pages.iter().map(|p| p.index).collect();

    // ── Step 3: Assemble, unless nothing came back ───────────────────────
    let document_path = if outcome.pages.is_empty() {
        warn!("No images were downloaded; skipping PDF creation.");
        None
    } else {
        if let Some(ref cb) = config.progress_callback {
            cb.on_assemble_start(outcome.pages.len());
        }
        info!("Saving {} images to PDF...", outcome.pages.len());
        let assemble_start = Instant::now();

        let images = outcome.pages;
        let bytes = tokio::task::spawn_blocking(move || assembler.assemble(&images))
            .await
            .map_err(|e| Pages2PdfError::Internal(format!("Assembly task panicked: {}", e)))??;

        let path = config.output_path();
        assemble::write_document(&path, &bytes).await?;
        stats.assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;
        Some(path)
    };

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Total time taken: {:.2} seconds ({:.2} seconds downloading, {:.2} seconds converting).",
        stats.total_duration_ms as f64 / 1000.0,
        stats.fetch_duration_ms as f64 / 1000.0,
        stats.assemble_duration_ms as f64 / 1000.0
    );

    Ok(RunOutput {
        document_path,
        pages,
        stop_reason: outcome.stop_reason,
        stats,
    })
}
