//! # edgequake-pages2pdf
//!
//! Fetch a run of numbered page images (book scans, slide exports, document
//! viewers that serve one image per page) and bind them into a single PDF.
//!
//! ## How it works
//!
//! ```text
//! sample URL  …/Book_0007.jp2&scale=4
//!  │
//!  ├─ 1. Template  split into prefix "…/Book_" + suffix ".jp2"
//!  ├─ 2. Schedule  fetch pages start..=end in concurrent batches
//!  │               stop after N consecutive failures
//!  ├─ 3. Assemble  one PDF page per image, native pixel size
//!  └─ 4. Output    <name>.pdf, written atomically
//! ```
//!
//! Pages are always bound in page order, whatever order the HTTP responses
//! arrive in. When the last page is unknown, leave the end page unbounded and
//! let the consecutive-failure budget detect the end of the book.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pages2pdf::{download_to_pdf, BatchSize, PageBound, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder("https://example.com/scans/book_0001.jpg", "book")
//!         .start_page(1)
//!         .end_page(PageBound::Unbounded)
//!         .max_consecutive_failures(10)
//!         .batch_size(BatchSize::Fixed(8))
//!         .build()?;
//!     let output = download_to_pdf(&config).await?;
//!     match output.document_path {
//!         Some(path) => println!("{} pages → {}", output.pages.len(), path.display()),
//!         None => eprintln!("no pages could be fetched"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pages2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchSize, PageBound, RunConfig, RunConfigBuilder};
pub use error::{FetchError, Pages2PdfError};
pub use output::{FetchedPage, RunOutput, RunStats, StopReason};
pub use pipeline::assemble::{DocumentAssembler, PdfiumAssembler};
pub use pipeline::fetch::{FetchOutcome, HttpFetcher, PageFetcher};
pub use pipeline::template::UrlTemplate;
pub use progress::{FetchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use run::{download_to_pdf, download_to_pdf_sync, run_with};
