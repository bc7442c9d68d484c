//! CLI binary for edgequake-pages2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RunConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pages2pdf::{
    download_to_pdf, BatchSize, FetchProgressCallback, PageBound, ProgressCallback, RunConfig,
    StopReason,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: an overall bar plus one bar per in-flight batch.
///
/// Pages complete out of order inside a batch, so the bars only count;
/// ordering is the scheduler's business.
struct CliProgressCallback {
    multi: MultiProgress,
    overall: ProgressBar,
    batch: Mutex<Option<ProgressBar>>,
    failed: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        overall.set_prefix("Preparing");
        overall.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            multi,
            overall,
            batch: Mutex::new(None),
            failed: AtomicUsize::new(0),
        })
    }

    fn bar_style(template: &str) -> ProgressStyle {
        ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS)
    }
}

impl FetchProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: Option<usize>) {
        match total_pages {
            Some(total) => {
                self.overall.set_length(total as u64);
                self.overall.set_style(Self::bar_style(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {pos:>4}/{len} pages  \
                     ⏱ {elapsed_precise}  ETA {eta_precise}",
                ));
            }
            // Unknown end page: count pages without a bar.
            None => self.overall.set_style(Self::bar_style(
                "{spinner:.cyan} {prefix:.bold}  {pos} pages tried  ⏱ {elapsed_precise}  {msg}",
            )),
        }
        self.overall.set_prefix("Overall");
        self.overall.reset_eta();
    }

    fn on_batch_start(&self, batch: usize, len: usize) {
        let bar = self.multi.add(ProgressBar::new(len as u64));
        bar.set_style(Self::bar_style(
            "  {prefix:.dim}  [{bar:30.cyan/238}] {pos:>3}/{len} pages",
        ));
        bar.set_prefix(format!("Batch {batch}"));
        *self.batch.lock().unwrap() = Some(bar);
    }

    fn on_page_fetched(&self, _page: u32, success: bool) {
        if !success {
            let failed = self.failed.fetch_add(1, Ordering::SeqCst) + 1;
            self.overall.set_message(dim(&format!("{failed} failed")));
        }
        self.overall.inc(1);
        if let Some(bar) = self.batch.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, batch: usize, succeeded: usize, dispatched: usize) {
        if let Some(bar) = self.batch.lock().unwrap().take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        let mark = if succeeded == dispatched {
            green("✓")
        } else if succeeded == 0 {
            red("✗")
        } else {
            cyan("⚠")
        };
        self.multi
            .println(format!(
                "  {mark} Batch {batch:>3} completed: {succeeded}/{dispatched} pages downloaded."
            ))
            .ok();
    }

    fn on_run_complete(&self, collected: usize, reason: StopReason) {
        self.overall.finish_and_clear();
        match reason {
            StopReason::FailureBudgetExhausted => eprintln!(
                "{} Stopped after consecutive failures — {} pages collected",
                cyan("◆"),
                bold(&collected.to_string())
            ),
            StopReason::RangeExhausted => eprintln!(
                "{} Page range finished — {} pages collected",
                cyan("◆"),
                bold(&collected.to_string())
            ),
        }
    }

    fn on_assemble_start(&self, pages: usize) {
        eprintln!("{} Saving {pages} images to PDF…", cyan("◆"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Fetch pages 0-250 at scale 4, eight at a time
  pages2pdf 'https://host/BookReaderImages.php?zip=…&file=…/Book_0001.jp2&id=book&scale=2' \
      -o book --end 250 --scale 4 --batch-size 8

  # Unknown page count: stop after 10 consecutive misses
  pages2pdf 'https://cdn.example.com/scans/page_0001.png' -o scans --end -1

  # One batch covering the whole range
  pages2pdf 'https://cdn.example.com/scans/page_0001.png' -o scans --end 40 --batch-size -1

  # Machine-readable summary
  pages2pdf 'https://cdn.example.com/scans/page_0001.png' -o scans --json > run.json

URL FORMAT:
  The sample URL must contain an underscore followed by a 4-digit page
  index (e.g. `_0007`). Everything before it is the prefix, everything after
  it the suffix. The sample's `scale=` and `rotate=` values are carried to
  every page; --scale / --rotate replace them.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Override the log filter (e.g. edgequake_pages2pdf=debug)
"#;

/// Fetch numbered page images and bind them into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pages2pdf",
    version,
    about = "Fetch numbered page images from a URL template and bind them into a PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// A real page URL containing a `_NNNN` page index.
    url: String,

    /// Output document name (".pdf" is appended when missing).
    #[arg(short, long, env = "PAGES2PDF_OUTPUT")]
    output: String,

    /// Directory to write the PDF into.
    #[arg(long, env = "PAGES2PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// First page index to fetch.
    #[arg(long, env = "PAGES2PDF_START", default_value_t = 0)]
    start: u32,

    /// Last page index to fetch (inclusive); -1 runs until the failure budget.
    #[arg(long, env = "PAGES2PDF_END", default_value_t = -1, allow_negative_numbers = true)]
    end: i64,

    /// Consecutive failed pages tolerated before stopping.
    #[arg(long, env = "PAGES2PDF_MAX_FAILURES", default_value_t = 10,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_failures: u32,

    /// Pages fetched concurrently per batch; -1 fetches the whole range at once.
    #[arg(short, long, env = "PAGES2PDF_BATCH_SIZE", default_value_t = 10, allow_negative_numbers = true)]
    batch_size: i64,

    /// Resolution multiplier sent as `scale=<n>` (default: the sample URL's).
    #[arg(long, env = "PAGES2PDF_SCALE")]
    scale: Option<u32>,

    /// Rotation sent as `rotate=<n>` (default: the sample URL's).
    #[arg(long, env = "PAGES2PDF_ROTATE")]
    rotate: Option<u32>,

    /// Per-page HTTP timeout in seconds.
    #[arg(long, env = "PAGES2PDF_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "PAGES2PDF_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "PAGES2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGES2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGES2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bars already show per-batch progress, so INFO logs would only
    // tear them apart.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Ensure PDFium engine is available ────────────────────────────────
    // Done before fetching so a missing engine never costs a full download run.
    if !pdfium_auto::is_pdfium_cached() {
        if show_progress {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(CliProgressCallback::bar_style(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            ));
            dl_bar.set_prefix("PDF engine");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let output = download_to_pdf(&config).await.context("Run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        let stats = &output.stats;
        match output.document_path {
            Some(ref path) => eprintln!(
                "{}  {} pages  →  {}",
                green("✔"),
                stats.pages_collected,
                bold(&path.display().to_string()),
            ),
            None => eprintln!(
                "{}  No images were downloaded; no PDF written.",
                red("✘")
            ),
        }
        eprintln!(
            "   Total time taken: {:.2} seconds ({:.2} seconds downloading, {:.2} seconds converting).",
            stats.total_duration_ms as f64 / 1000.0,
            stats.fetch_duration_ms as f64 / 1000.0,
            stats.assemble_duration_ms as f64 / 1000.0,
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "{} requests in {} batches, {} failed",
                stats.pages_attempted, stats.batches, stats.pages_failed
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let end_page = PageBound::from_sentinel(cli.end).context("Invalid --end")?;
    let batch_size = BatchSize::from_sentinel(cli.batch_size).context("Invalid --batch-size")?;

    let mut builder = RunConfig::builder(&cli.url, &cli.output)
        .start_page(cli.start)
        .end_page(end_page)
        .max_consecutive_failures(cli.max_failures)
        .batch_size(batch_size)
        .output_dir(&cli.output_dir)
        .fetch_timeout_secs(cli.timeout);

    if let Some(scale) = cli.scale {
        builder = builder.scale(scale);
    }
    if let Some(rotate) = cli.rotate {
        builder = builder.rotate(rotate);
    }
    if !cli.quiet && !cli.no_progress && !cli.json {
        let cb = CliProgressCallback::new();
        builder = builder.progress_callback(cb as ProgressCallback);
    }

    builder.build().context("Invalid configuration")
}
