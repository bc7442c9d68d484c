//! Result types produced by a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Raw bytes of one successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Page index the bytes were fetched for.
    pub index: u32,
    /// Undecoded image payload as served.
    pub bytes: Vec<u8>,
}

/// Why the scheduler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// `max_consecutive_failures` back-to-back fetches failed.
    FailureBudgetExhausted,
    /// The cursor moved past the configured end page.
    RangeExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::FailureBudgetExhausted => f.write_str("failure budget exhausted"),
            StopReason::RangeExhausted => f.write_str("page range exhausted"),
        }
    }
}

/// Timing and counters for a completed run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Page fetches dispatched.
    pub pages_attempted: usize,
    /// Pages whose images made it into the document.
    pub pages_collected: usize,
    /// Failed fetches that were reduced (dispatched-but-unreduced ones excluded).
    pub pages_failed: usize,
    /// Batches dispatched.
    pub batches: usize,
    /// Wall-clock time of the whole run.
    pub total_duration_ms: u64,
    /// Time spent in the scheduler.
    pub fetch_duration_ms: u64,
    /// Time spent building and writing the document (0 when skipped).
    pub assemble_duration_ms: u64,
}

/// Outcome of [`crate::run::download_to_pdf`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    /// Where the PDF was written; `None` when no page could be fetched.
    pub document_path: Option<PathBuf>,
    /// Indices of the pages in the document, in page order.
    pub pages: Vec<u32>,
    /// Terminal state the scheduler reached.
    pub stop_reason: StopReason,
    pub stats: RunStats,
}

impl RunOutput {
    /// `true` when a document was produced.
    pub fn has_document(&self) -> bool {
        self.document_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reason_display() {
        assert_eq!(
            StopReason::FailureBudgetExhausted.to_string(),
            "failure budget exhausted"
        );
        assert_eq!(StopReason::RangeExhausted.to_string(), "page range exhausted");
    }

    #[test]
    fn run_output_serialises() {
        let out = RunOutput {
            document_path: None,
            pages: vec![],
            stop_reason: StopReason::FailureBudgetExhausted,
            stats: RunStats::default(),
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("FailureBudgetExhausted"));
        assert!(!out.has_document());
    }
}
