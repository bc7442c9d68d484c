//! Error types for the edgequake-pages2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pages2PdfError`] — **Fatal**: the run cannot proceed at all
//!   (malformed sample URL, invalid configuration, undecodable page image,
//!   unwritable output). Returned as `Err(Pages2PdfError)` from the
//!   top-level `download_to_pdf*` functions.
//!
//! * [`FetchError`] — **Non-fatal**: a single page could not be fetched.
//!   It travels inside [`crate::pipeline::fetch::FetchOutcome::Failure`] and
//!   only ever feeds the consecutive-failure counter; it is never returned
//!   to the caller.
//!
//! Running out of failure budget and collecting zero images are not errors
//! at all: both are reported through [`crate::output::RunOutput`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pages2pdf library.
#[derive(Debug, Error)]
pub enum Pages2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The sample URL has no `_NNNN` page index to template on.
    #[error(
        "Malformed sample URL '{url}'\n\
Expected an underscore followed by a 4-digit page index, e.g. '..._0007.jp2&scale=4'."
    )]
    MalformedUrl { url: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A fetched page is not a decodable raster image.
    #[error("Page {page} is not a decodable image: {detail}")]
    ImageDecode { page: u32, detail: String },

    /// pdfium refused to build or serialise the document.
    #[error("Failed to build PDF document: {0}")]
    DocumentBuildFailed(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FetchError {
    /// Connection, DNS or body-read failure.
    #[error("Page {page}: transport error: {detail}")]
    Transport { page: u32, detail: String },

    /// Server answered with a non-2xx status.
    #[error("Page {page}: HTTP {status}")]
    HttpStatus { page: u32, status: u16 },

    /// The request exceeded the per-request timeout.
    #[error("Page {page}: timed out after {secs}s")]
    Timeout { page: u32, secs: u64 },

    /// 2xx response with no payload.
    #[error("Page {page}: empty response body")]
    EmptyBody { page: u32 },
}

impl FetchError {
    /// Page index the failure belongs to.
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Transport { page, .. }
            | FetchError::HttpStatus { page, .. }
            | FetchError::Timeout { page, .. }
            | FetchError::EmptyBody { page } => *page,
        }
    }
}
