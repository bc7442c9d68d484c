//! Configuration types for a page-fetch run.
//!
//! Every knob of a run lives in one immutable [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Fixed vs. open-ended page ranges and single-shot vs.
//! batched fetching are fields of that one struct ([`PageBound`],
//! [`BatchSize`]) rather than separate code paths, so every combination goes
//! through the same scheduler.

use crate::error::Pages2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for one fetch-and-assemble run.
///
/// Built via [`RunConfig::builder()`].
///
/// # Example
/// ```rust
/// use edgequake_pages2pdf::{BatchSize, PageBound, RunConfig};
///
/// let config = RunConfig::builder("https://example.com/book/page_0001.jpg", "book")
///     .start_page(1)
///     .end_page(PageBound::Bounded(120))
///     .batch_size(BatchSize::Fixed(8))
///     .max_consecutive_failures(5)
///     .scale(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_path().file_name().unwrap(), "book.pdf");
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// One real page URL containing a `_NNNN` page index.
    pub sample_url: String,

    /// First page index to fetch. Default: 0.
    pub start_page: u32,

    /// Last page index to fetch (inclusive). Default: [`PageBound::Unbounded`].
    pub end_page: PageBound,

    /// Back-to-back failed fetches tolerated before the run stops. Default: 10.
    ///
    /// Scanned books rarely have gaps longer than a handful of pages, so ten
    /// consecutive misses is a reliable "past the last page" signal when the
    /// end page is unknown.
    pub max_consecutive_failures: u32,

    /// How many pages are fetched concurrently per batch. Default: `Fixed(10)`.
    pub batch_size: BatchSize,

    /// Resolution multiplier substituted into each URL as `scale=<n>`.
    pub scale: Option<u32>,

    /// Rotation substituted into each URL as `rotate=<n>`.
    pub rotate: Option<u32>,

    /// Output document name; `.pdf` is appended when missing.
    pub output_name: String,

    /// Directory the document is written to. Default: current directory.
    pub output_dir: PathBuf,

    /// Per-request HTTP timeout in seconds. Default: 60.
    pub fetch_timeout_secs: u64,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("sample_url", &self.sample_url)
            .field("start_page", &self.start_page)
            .field("end_page", &self.end_page)
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .field("batch_size", &self.batch_size)
            .field("scale", &self.scale)
            .field("rotate", &self.rotate)
            .field("output_name", &self.output_name)
            .field("output_dir", &self.output_dir)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn FetchProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder with defaults for every optional field.
    pub fn builder(
        sample_url: impl Into<String>,
        output_name: impl Into<String>,
    ) -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self {
                sample_url: sample_url.into(),
                start_page: 0,
                end_page: PageBound::Unbounded,
                max_consecutive_failures: 10,
                batch_size: BatchSize::Fixed(10),
                scale: None,
                rotate: None,
                output_name: output_name.into(),
                output_dir: PathBuf::from("."),
                fetch_timeout_secs: 60,
                progress_callback: None,
            },
        }
    }

    /// Number of pages in the configured range, or `None` when unbounded.
    pub fn total_pages(&self) -> Option<usize> {
        match self.end_page {
            PageBound::Bounded(end) => Some(end.saturating_sub(self.start_page) as usize + 1),
            PageBound::Unbounded => None,
        }
    }

    /// Full path of the document this run writes.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(document_file_name(&self.output_name))
    }
}

/// Append `.pdf` unless the name already carries it.
fn document_file_name(name: &str) -> String {
    let has_pdf_ext = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if has_pdf_ext {
        name.to_string()
    } else {
        format!("{name}.pdf")
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn start_page(mut self, page: u32) -> Self {
        self.config.start_page = page;
        self
    }

    pub fn end_page(mut self, bound: PageBound) -> Self {
        self.config.end_page = bound;
        self
    }

    pub fn max_consecutive_failures(mut self, n: u32) -> Self {
        self.config.max_consecutive_failures = n;
        self
    }

    pub fn batch_size(mut self, size: BatchSize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.config.scale = Some(scale);
        self
    }

    pub fn rotate(mut self, rotate: u32) -> Self {
        self.config.rotate = Some(rotate);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Pages2PdfError> {
        let c = &self.config;
        if let PageBound::Bounded(end) = c.end_page {
            if end < c.start_page {
                return Err(Pages2PdfError::InvalidConfig(format!(
                    "End page {} is before start page {}",
                    end, c.start_page
                )));
            }
        }
        if c.max_consecutive_failures == 0 {
            return Err(Pages2PdfError::InvalidConfig(
                "Max consecutive failures must be ≥ 1".into(),
            ));
        }
        if c.batch_size == BatchSize::Fixed(0) {
            return Err(Pages2PdfError::InvalidConfig(
                "Batch size must be ≥ 1".into(),
            ));
        }
        if c.output_name.trim().is_empty() {
            return Err(Pages2PdfError::InvalidConfig(
                "Output name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Last page of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageBound {
    /// Stop after this page index (inclusive).
    Bounded(u32),
    /// Keep going until the failure budget is exhausted. (default)
    #[default]
    Unbounded,
}

impl PageBound {
    /// Map the CLI convention (`-1` = unbounded) onto a bound.
    pub fn from_sentinel(value: i64) -> Result<Self, Pages2PdfError> {
        match value {
            -1 => Ok(PageBound::Unbounded),
            v if v >= 0 => u32::try_from(v).map(PageBound::Bounded).map_err(|_| {
                Pages2PdfError::InvalidConfig(format!("End page {v} is too large"))
            }),
            v => Err(Pages2PdfError::InvalidConfig(format!(
                "End page must be ≥ 0 or -1 for unbounded, got {v}"
            ))),
        }
    }

    /// Whether `page` is still inside the range.
    pub fn contains(&self, page: u32) -> bool {
        match self {
            PageBound::Bounded(end) => page <= *end,
            PageBound::Unbounded => true,
        }
    }
}

/// How many pages one batch dispatches concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchSize {
    /// At most this many pages per batch.
    Fixed(usize),
    /// One batch covering the whole remaining range.
    WholeRange,
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize::Fixed(10)
    }
}

impl BatchSize {
    /// Map the CLI convention (`-1` = whole range) onto a batch size.
    pub fn from_sentinel(value: i64) -> Result<Self, Pages2PdfError> {
        match value {
            -1 => Ok(BatchSize::WholeRange),
            v if v > 0 => Ok(BatchSize::Fixed(v as usize)),
            v => Err(Pages2PdfError::InvalidConfig(format!(
                "Batch size must be ≥ 1 or -1 for the whole range, got {v}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/book_0001.jpg";

    #[test]
    fn defaults() {
        let c = RunConfig::builder(URL, "book").build().unwrap();
        assert_eq!(c.start_page, 0);
        assert_eq!(c.end_page, PageBound::Unbounded);
        assert_eq!(c.max_consecutive_failures, 10);
        assert_eq!(c.batch_size, BatchSize::Fixed(10));
        assert_eq!(c.total_pages(), None);
        assert_eq!(c.output_path(), PathBuf::from("./book.pdf"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = RunConfig::builder(URL, "book")
            .start_page(10)
            .end_page(PageBound::Bounded(5))
            .build()
            .unwrap_err();
        assert!(matches!(err, Pages2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn zero_budget_and_zero_batch_are_rejected() {
        assert!(RunConfig::builder(URL, "book")
            .max_consecutive_failures(0)
            .build()
            .is_err());
        assert!(RunConfig::builder(URL, "book")
            .batch_size(BatchSize::Fixed(0))
            .build()
            .is_err());
        assert!(RunConfig::builder(URL, "  ").build().is_err());
    }

    #[test]
    fn total_pages_is_inclusive() {
        let c = RunConfig::builder(URL, "book")
            .start_page(3)
            .end_page(PageBound::Bounded(7))
            .build()
            .unwrap();
        assert_eq!(c.total_pages(), Some(5));
    }

    #[test]
    fn output_name_keeps_existing_pdf_extension() {
        assert_eq!(document_file_name("book"), "book.pdf");
        assert_eq!(document_file_name("book.PDF"), "book.PDF");
        assert_eq!(document_file_name("vol.2"), "vol.2.pdf");
    }

    #[test]
    fn sentinels() {
        assert_eq!(PageBound::from_sentinel(-1).unwrap(), PageBound::Unbounded);
        assert_eq!(PageBound::from_sentinel(42).unwrap(), PageBound::Bounded(42));
        assert!(PageBound::from_sentinel(-2).is_err());

        assert_eq!(BatchSize::from_sentinel(-1).unwrap(), BatchSize::WholeRange);
        assert_eq!(BatchSize::from_sentinel(4).unwrap(), BatchSize::Fixed(4));
        assert!(BatchSize::from_sentinel(0).is_err());
    }

    #[test]
    fn bound_contains() {
        assert!(PageBound::Bounded(5).contains(5));
        assert!(!PageBound::Bounded(5).contains(6));
        assert!(PageBound::Unbounded.contains(u32::MAX));
    }
}
