//! Helper utilities for integration tests.

pub mod bam_generator;

pub use assertions::*;
pub use bam_generator::*;

use std::process::{Command, Output};

/// Runs `covcap subsample` with `args` and returns its output.
pub fn run_subsample(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_covcap"))
        .arg("subsample")
        .args(args)
        .output()
        .expect("Failed to run covcap subsample")
}
