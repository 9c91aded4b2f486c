//! Integration tests for argument validation.
//!
//! Every rejected invocation exits with status 1 and leaves no output file.

use std::fs;
use tempfile::TempDir;

use crate::helpers::{create_coordinate_header, run_subsample, stacked_reads, write_bam};

fn assert_rejected(args: &[&str], expected_message: &str) {
    let result = run_subsample(args);
    assert_eq!(result.status.code(), Some(1), "args: {args:?}");
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains(expected_message), "expected '{expected_message}' in: {stderr}");
}

#[test]
fn test_zero_max_cov_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    let output = dir.path().join("output.bam");

    assert_rejected(
        &["--type", "coverage", "--max-cov", "0", "-o", output.to_str().unwrap(), input.to_str().unwrap()],
        "max-cov",
    );
    assert!(!output.exists());
}

#[test]
fn test_missing_max_cov_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    let output = dir.path().join("output.bam");

    assert_rejected(
        &["--type", "coverage", "-o", output.to_str().unwrap(), input.to_str().unwrap()],
        "--max-cov",
    );
}

#[test]
fn test_missing_inputs_is_a_usage_error() {
    assert_rejected(&["--type", "coverage", "--max-cov", "5", "-o", "out.bam"], "INPUTS");
}

#[test]
fn test_unknown_type_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));

    assert_rejected(
        &["--type", "fraction", "--max-cov", "5", "-o", "out.bam", input.to_str().unwrap()],
        "fraction",
    );
}

#[test]
fn test_output_equal_to_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    let before = fs::read(&input).unwrap();

    assert_rejected(
        &["--type", "coverage", "--max-cov", "5", "-o", input.to_str().unwrap(), input.to_str().unwrap()],
        "would overwrite input",
    );
    assert_eq!(fs::read(&input).unwrap(), before);
}

#[test]
fn test_missing_input_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("missing.bam");
    let output = dir.path().join("output.bam");

    assert_rejected(
        &["--type", "coverage", "--max-cov", "5", "-o", output.to_str().unwrap(), input.to_str().unwrap()],
        "File does not exist",
    );
    assert!(!output.exists());
}

#[test]
fn test_out_of_range_compression_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    let output = dir.path().join("output.bam");

    assert_rejected(
        &[
            "--type",
            "coverage",
            "--max-cov",
            "5",
            "--compression-level",
            "13",
            "-o",
            output.to_str().unwrap(),
            input.to_str().unwrap(),
        ],
        "compression-level",
    );
}

#[test]
fn test_passthrough_factor_of_one_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    write_bam(&input, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    let output = dir.path().join("output.bam");

    assert_rejected(
        &[
            "--type",
            "coverage",
            "--max-cov",
            "5",
            "--passthrough-factor",
            "1",
            "-o",
            output.to_str().unwrap(),
            input.to_str().unwrap(),
        ],
        "passthrough-factor",
    );
}

#[test]
fn test_inputs_with_same_stem_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (x, y) = (dir.path().join("x"), dir.path().join("y"));
    fs::create_dir(&x).unwrap();
    fs::create_dir(&y).unwrap();
    let (a1, a2) = (x.join("a.bam"), y.join("a.bam"));
    for path in [&a1, &a2] {
        write_bam(path, &create_coordinate_header(), &stacked_reads("r", 2, 0, 100, 50));
    }
    let output = dir.path().join("capped.bam");

    assert_rejected(
        &[
            "--type",
            "coverage",
            "--max-cov",
            "5",
            "-o",
            output.to_str().unwrap(),
            a1.to_str().unwrap(),
            a2.to_str().unwrap(),
        ],
        "derived from more than one input",
    );
    assert!(!dir.path().join("capped.a.bam").exists());
}
