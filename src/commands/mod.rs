//! CLI command implementations for covcap.
//!
//! - [`subsample`] - Cap coverage in coordinate-sorted BAM files

#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod subsample;
