//! Integration tests for covcap.
//!
//! These tests build BAM files with noodles, run the compiled binary, and
//! inspect the BAM files it writes.

mod helpers;
mod test_cli_validation;
mod test_subsample_command;
