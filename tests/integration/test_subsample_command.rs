//! Integration tests for the subsample command.

use noodles::sam::alignment::record_buf::RecordBuf;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::helpers::{
    assert_same_apart_from_qc_flag, create_coordinate_header, create_header, mapped_read,
    qc_fail_names, read_bam, record_names, run_subsample, stacked_reads, unmapped_read, write_bam,
};

/// A deep stack on chr1, a shallow region further along chr1, reads on chr2
/// and trailing unmapped reads.
fn mixed_coverage_records() -> Vec<RecordBuf> {
    let mut records = stacked_reads("deep", 100, 0, 100, 50);
    records.extend(stacked_reads("shallow", 5, 0, 5_000, 50));
    records.extend((0..4).map(|i| mapped_read(&format!("chr2_{i}"), 1, 200 + i * 10, 40)));
    records.push(unmapped_read("unmapped_0", 30));
    records.push(unmapped_read("unmapped_1", 30));
    records
}

fn write_input(dir: &Path, name: &str, records: &[RecordBuf]) -> std::path::PathBuf {
    let path = dir.join(name);
    write_bam(&path, &create_coordinate_header(), records);
    path
}

fn run_ok(args: &[&str]) {
    let output = run_subsample(args);
    assert!(
        output.status.success(),
        "subsample failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_flag_mode_marks_only_over_covered_reads() {
    let dir = TempDir::new().unwrap();
    let records = mixed_coverage_records();
    let input = write_input(dir.path(), "input.bam", &records);
    let output = dir.path().join("output.bam");

    run_ok(&[
        "--type",
        "coverage",
        "--max-cov",
        "10",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);

    let (_, out_records) = read_bam(&output);
    assert_same_apart_from_qc_flag(&records, &out_records);

    let flagged = qc_fail_names(&out_records);
    assert!(!flagged.is_empty(), "a 100x stack capped at 10x should lose reads");
    assert!(flagged.len() < 100, "some of the deep stack should survive");
    assert!(flagged.iter().all(|name| name.starts_with("deep_")), "flagged: {flagged:?}");
}

#[test]
fn test_remove_mode_drops_exactly_the_flagged_reads() {
    let dir = TempDir::new().unwrap();
    let records = mixed_coverage_records();
    let input = write_input(dir.path(), "input.bam", &records);
    let flagged_out = dir.path().join("flagged.bam");
    let removed_out = dir.path().join("removed.bam");

    let base = vec!["--type", "coverage", "--max-cov", "10", input.to_str().unwrap()];
    let mut flag_args = base.clone();
    flag_args.extend(["-o", flagged_out.to_str().unwrap()]);
    run_ok(&flag_args);
    let mut remove_args = base;
    remove_args.extend(["-r", "-o", removed_out.to_str().unwrap()]);
    run_ok(&remove_args);

    let (_, flagged_records) = read_bam(&flagged_out);
    let (_, removed_records) = read_bam(&removed_out);
    let flagged = qc_fail_names(&flagged_records);

    let expected: Vec<String> =
        record_names(&records).into_iter().filter(|name| !flagged.contains(name)).collect();
    assert_eq!(record_names(&removed_records), expected);
    assert!(qc_fail_names(&removed_records).is_empty());
}

#[test]
fn test_low_coverage_input_is_unchanged() {
    let dir = TempDir::new().unwrap();
    let records = stacked_reads("r", 8, 0, 100, 50);
    let input = write_input(dir.path(), "input.bam", &records);
    let output = dir.path().join("output.bam");

    run_ok(&[
        "--type",
        "coverage",
        "--max-cov",
        "8",
        "-r",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);

    let (_, out_records) = read_bam(&output);
    assert_eq!(record_names(&out_records), record_names(&records));
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "input.bam", &mixed_coverage_records());
    let output = dir.path().join("output.bam");
    let args =
        ["--type", "coverage", "--max-cov", "7", "-o", output.to_str().unwrap(), input.to_str().unwrap()];

    run_ok(&args);
    let first = fs::read(&output).unwrap();
    run_ok(&args);
    let second = fs::read(&output).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_output_header_has_program_record() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "input.bam", &stacked_reads("r", 3, 0, 100, 50));
    let output = dir.path().join("output.bam");

    run_ok(&[
        "--type",
        "coverage",
        "--max-cov",
        "5",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);

    let (header, _) = read_bam(&output);
    assert!(header.programs().as_ref().contains_key(b"covcap".as_slice()));
    assert_eq!(header.reference_sequences().len(), 2);
}

#[test]
fn test_unsorted_input_fails() {
    let dir = TempDir::new().unwrap();
    let records = vec![mapped_read("late", 0, 500, 50), mapped_read("early", 0, 100, 50)];
    let input = write_input(dir.path(), "input.bam", &records);
    let output = dir.path().join("output.bam");

    let result = run_subsample(&[
        "--type",
        "coverage",
        "--max-cov",
        "5",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("not coordinate sorted"), "stderr: {stderr}");
}

#[test]
fn test_non_coordinate_header_is_only_a_warning() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    let header = create_header(&[("chr1", 10_000)], "unsorted");
    write_bam(&input, &header, &stacked_reads("r", 3, 0, 100, 50));
    let output = dir.path().join("output.bam");

    let result = run_subsample(&[
        "--type",
        "coverage",
        "--max-cov",
        "5",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);

    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("declares sort order 'unsorted'"));
    assert_eq!(read_bam(&output).1.len(), 3);
}

#[test]
fn test_multiple_inputs_get_separate_outputs() {
    let dir = TempDir::new().unwrap();
    let a = write_input(dir.path(), "a.bam", &stacked_reads("a", 4, 0, 100, 50));
    let b = write_input(dir.path(), "b.bam", &stacked_reads("b", 6, 1, 100, 50));
    let out_dir = dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();
    let output = out_dir.join("capped.bam");

    run_ok(&[
        "--type",
        "coverage",
        "--max-cov",
        "10",
        "-o",
        output.to_str().unwrap(),
        a.to_str().unwrap(),
        b.to_str().unwrap(),
    ]);

    assert!(!output.exists());
    assert_eq!(read_bam(&out_dir.join("capped.a.bam")).1.len(), 4);
    assert_eq!(read_bam(&out_dir.join("capped.b.bam")).1.len(), 6);
}

#[test]
fn test_failed_input_does_not_stop_later_inputs() {
    let dir = TempDir::new().unwrap();
    let bad = write_input(
        dir.path(),
        "bad.bam",
        &[mapped_read("late", 0, 500, 50), mapped_read("early", 0, 100, 50)],
    );
    let good = write_input(dir.path(), "good.bam", &stacked_reads("g", 3, 0, 100, 50));
    let output = dir.path().join("capped.bam");

    let result = run_subsample(&[
        "--type",
        "coverage",
        "--max-cov",
        "10",
        "-o",
        output.to_str().unwrap(),
        bad.to_str().unwrap(),
        good.to_str().unwrap(),
    ]);

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("bad.bam"), "stderr: {stderr}");
    assert_eq!(read_bam(&dir.path().join("capped.good.bam")).1.len(), 3);
}

#[test]
fn test_metrics_file_has_one_row_per_input() {
    let dir = TempDir::new().unwrap();
    let a = write_input(dir.path(), "a.bam", &mixed_coverage_records());
    let b = write_input(dir.path(), "b.bam", &stacked_reads("b", 2, 0, 100, 50));
    let output = dir.path().join("capped.bam");
    let metrics = dir.path().join("metrics.tsv");

    run_ok(&[
        "--type",
        "coverage",
        "--max-cov",
        "10",
        "-r",
        "--metrics",
        metrics.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        a.to_str().unwrap(),
        b.to_str().unwrap(),
    ]);

    let contents = fs::read_to_string(&metrics).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    let columns: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(columns[0], "input");
    assert!(columns.contains(&"removed_records"));

    let total = columns.iter().position(|c| *c == "total_records").unwrap();
    let unmapped = columns.iter().position(|c| *c == "unmapped_records").unwrap();
    let removed = columns.iter().position(|c| *c == "removed_records").unwrap();
    let emitted = columns.iter().position(|c| *c == "emitted_records").unwrap();

    let first: Vec<&str> = lines[1].split('\t').collect();
    assert!(first[0].ends_with("a.bam"));
    assert_eq!(first[total], "111");
    assert_eq!(first[unmapped], "2");
    let removed_count: u64 = first[removed].parse().unwrap();
    let emitted_count: u64 = first[emitted].parse().unwrap();
    assert_eq!(removed_count + emitted_count, 111);
    assert_eq!(emitted_count as usize, read_bam(&dir.path().join("capped.a.bam")).1.len());

    let second: Vec<&str> = lines[2].split('\t').collect();
    assert_eq!(second[total], "2");
    assert_eq!(second[removed], "0");
}
