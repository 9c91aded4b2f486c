//! Per-file subsampling statistics and the TSV metrics writer.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

/// Counts collected while subsampling one input file.
///
/// Serialized as one row of the `--metrics` TSV, columns in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsampleMetrics {
    /// Input file the row describes.
    pub input: String,
    /// Records read.
    pub total_records: u64,
    pub mapped_records: u64,
    pub unmapped_records: u64,
    /// Records that already carried the QC-fail flag on input.
    pub qc_fail_records: u64,
    /// Records whose coverage was estimated.
    pub evaluated_records: u64,
    /// Evaluated records whose coverage exceeded the cap.
    pub over_cap_records: u64,
    pub kept_records: u64,
    pub dropped_records: u64,
    /// Dropped records written with the QC-fail flag set.
    pub flagged_records: u64,
    /// Dropped records omitted from the output.
    pub removed_records: u64,
    /// Records written to the output.
    pub emitted_records: u64,
    /// Records emitted unevaluated because the window hit its size cap.
    pub passthrough_records: u64,
    /// Highest coverage estimate seen.
    pub max_coverage: u32,
    /// Most records held in the window at once.
    pub peak_window_size: u64,
}

impl SubsampleMetrics {
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self { input: input.into(), ..Self::default() }
    }

    /// Fraction of evaluated records that were dropped.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn drop_fraction(&self) -> f64 {
        if self.evaluated_records == 0 {
            0.0
        } else {
            self.dropped_records as f64 / self.evaluated_records as f64
        }
    }
}

/// Write metrics rows to a TSV file with a snake_case header line.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path_ref.display()))
}
