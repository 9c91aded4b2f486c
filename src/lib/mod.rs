#![deny(unsafe_code)]
// Clippy lint configuration for CI
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # covcap - coverage capping for coordinate-sorted BAM files
//!
//! covcap reduces sequencing depth in over-covered regions of a
//! coordinate-sorted BAM file while leaving lower-coverage regions untouched.
//! Records whose estimated coverage exceeds a target are dropped with a
//! probability chosen so that, in expectation, the target survives. Dropped
//! records are either flagged QC-fail or removed from the output.
//!
//! ## Overview
//!
//! ### Core
//!
//! - **[`thinner`]** - The streaming engine: windowing, coverage estimation and reaping
//! - **[`window`]** - Ring buffer with stable logical indices
//! - **[`record`]** - Raw alignment records and their decision state
//! - **[`sampler`]** - Read-name hashed keep/drop decisions
//! - **[`stream`]** - Record source and sink traits
//!
//! ### I/O
//!
//! - **[`bam_io`]** - Raw BAM reading and writing
//! - **[`bgzf_writer`]** - Inline BGZF compression
//! - **[`header`]** - @PG records and sort-order checks
//!
//! ### Utilities
//!
//! - **[`errors`]** - Error types
//! - **[`metrics`]** - Per-file statistics and TSV output
//! - **[`logging`]** - Formatting helpers and summaries
//! - **[`progress`]** - Interval progress logging
//! - **[`validation`]** - Parameter and path validation

pub mod bam_io;
pub mod bgzf_writer;
pub mod errors;
pub mod header;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod record;
pub mod sampler;
pub mod stream;
pub mod thinner;
pub mod validation;
pub mod window;

pub use errors::{CovcapError, Result};
pub use thinner::{CoverageThinner, ThinnerConfig};
