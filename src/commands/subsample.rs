//! Cap coverage in coordinate-sorted BAM files.
//!
//! Records are streamed through a sliding window. Each mapped record's
//! coverage is estimated from the records overlapping its ends, and records
//! above the target are dropped with probability `(cov - max) / cov`, decided
//! by a hash of the read name so that mates and reruns agree.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use covcap_lib::bam_io::{create_raw_bam_reader, create_raw_bam_writer};
use covcap_lib::header::{is_coordinate_sorted, sort_order};
use covcap_lib::logging::{OperationTimer, log_subsample_summary};
use covcap_lib::metrics::{SubsampleMetrics, write_metrics};
use covcap_lib::progress::ProgressTracker;
use covcap_lib::thinner::DEFAULT_PASSTHROUGH_FACTOR;
use covcap_lib::validation::{validate_file_exists, validate_output_paths, validate_positive};
use covcap_lib::{CoverageThinner, ThinnerConfig};
use log::{error, info, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::commands::command::Command;
use crate::commands::common::{CompressionOptions, ThreadingOptions, add_pg_record};

/// Subsampling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubsampleAlgorithm {
    /// Cap per-position coverage at `--max-cov`.
    Coverage,
}

/// Reduce coverage in over-covered regions of coordinate-sorted BAM files.
#[derive(Debug, Parser)]
#[command(
    name = "subsample",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mCap coverage in coordinate-sorted BAM files\x1b[0m",
    long_about = r#"
Cap coverage in coordinate-sorted BAM files.

Reads are streamed in coordinate order. For each mapped read the coverage at
its two ends is estimated from the reads around it; reads in regions above
--max-cov are dropped with probability (coverage - max) / coverage, so that in
expectation --max-cov reads survive. Reads in regions at or below the cap are
never dropped. Unmapped and QC-failed reads are passed through unchanged.

Decisions are a deterministic function of the read name, so both reads of a
pair share the same fate and repeated runs produce identical output.

Dropped reads are flagged QC-fail (0x200) by default, or removed with --remove.

When more than one input is given, each input is written to
<output dir>/<output stem>.<input stem>.bam.

Example usage:
  covcap subsample --type coverage --max-cov 100 -o capped.bam input.bam
  covcap subsample --type coverage --max-cov 50 -r -o capped.bam a.bam b.bam
"#
)]
pub struct Subsample {
    /// Input BAM files, coordinate sorted
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output BAM file (or naming template when several inputs are given)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Subsampling algorithm
    #[arg(long = "type", value_enum)]
    pub algorithm: SubsampleAlgorithm,

    /// Target maximum coverage
    #[arg(long = "max-cov")]
    pub max_cov: u32,

    /// Remove dropped reads instead of flagging them QC-fail
    #[arg(short = 'r', long = "remove", default_value = "false")]
    pub remove: bool,

    /// Pass reads through unevaluated while the window holds this many times
    /// --max-cov reads (0 disables)
    #[arg(long = "passthrough-factor", default_value_t = DEFAULT_PASSTHROUGH_FACTOR)]
    pub passthrough_factor: u32,

    /// Optional TSV file of per-input metrics
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Threading options for input decompression.
    #[command(flatten)]
    pub threading: ThreadingOptions,

    /// Compression options for output BAM.
    #[command(flatten)]
    pub compression: CompressionOptions,
}

impl Command for Subsample {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.validate()?;
        let outputs = derive_output_paths(&self.inputs, &self.output)?;
        validate_output_paths(&self.inputs, &outputs)?;

        info!("Starting Subsample");
        info!("Algorithm: {:?}", self.algorithm);
        info!("Max coverage: {}", self.max_cov);
        info!("Dropped reads: {}", if self.remove { "removed" } else { "flagged QC-fail" });
        match self.passthrough_factor {
            0 => info!("Pass-through safeguard: disabled"),
            factor => info!("Pass-through safeguard: {factor}x max coverage"),
        }

        let config = ThinnerConfig::new(self.max_cov)
            .with_remove(self.remove)
            .with_passthrough_factor(self.passthrough_factor);

        let mut all_metrics = Vec::with_capacity(self.inputs.len());
        let mut failed = Vec::new();
        for (input, output) in self.inputs.iter().zip(&outputs) {
            match self.subsample_file(input, output, config, command_line) {
                Ok(metrics) => all_metrics.push(metrics),
                Err(e) => {
                    error!("Failed to subsample {}: {e:#}", input.display());
                    failed.push(input.display().to_string());
                }
            }
        }

        if let Some(path) = &self.metrics {
            write_metrics(path, &all_metrics, "subsample")?;
            info!("Wrote metrics to {}", path.display());
        }

        if !failed.is_empty() {
            bail!("Subsampling failed for {} input(s): {}", failed.len(), failed.join(", "));
        }
        Ok(())
    }
}

impl Subsample {
    fn validate(&self) -> Result<()> {
        for input in &self.inputs {
            validate_file_exists(input, "Input BAM")?;
        }
        validate_positive(self.max_cov, "max-cov")?;
        if self.passthrough_factor == 1 {
            bail!("--passthrough-factor must be 0 (disabled) or at least 2, got 1");
        }
        self.threading.validate()?;
        self.compression.validate()?;
        Ok(())
    }

    fn subsample_file(
        &self,
        input: &Path,
        output: &Path,
        config: ThinnerConfig,
        command_line: &str,
    ) -> Result<SubsampleMetrics> {
        info!("Input: {}", input.display());
        info!("Output: {}", output.display());
        let timer = OperationTimer::new("Subsampling reads");

        let (reader, header) = create_raw_bam_reader(input, self.threading.threads)?;
        if !is_coordinate_sorted(&header) {
            let so = sort_order(&header).map_or_else(
                || "missing".to_string(),
                |so| String::from_utf8_lossy(so).into_owned(),
            );
            warn!(
                "Header of {} declares sort order '{so}'; records must still be in coordinate order",
                input.display()
            );
        }

        let header = add_pg_record(header, command_line)?;
        let writer = create_raw_bam_writer(output, &header, self.compression.compression_level)?;

        let (writer, metrics) = CoverageThinner::new(config, reader, writer)
            .with_input_name(input.display().to_string())
            .with_progress(ProgressTracker::new("Processed records"))
            .run()
            .with_context(|| format!("Error while subsampling {}", input.display()))?;
        writer
            .finish()
            .with_context(|| format!("Failed to finish output BAM: {}", output.display()))?;

        log_subsample_summary(&metrics);
        timer.log_completion(metrics.total_records);
        Ok(metrics)
    }
}

/// One output per input: `output` itself for a single input, otherwise
/// `<output parent>/<output stem>.<input stem>.bam`.
fn derive_output_paths(inputs: &[PathBuf], output: &Path) -> Result<Vec<PathBuf>> {
    if inputs.len() == 1 {
        return Ok(vec![output.to_path_buf()]);
    }
    let parent = output.parent().unwrap_or_else(|| Path::new(""));
    let out_stem = file_stem(output)?;
    inputs
        .iter()
        .map(|input| {
            let in_stem = file_stem(input)?;
            Ok(parent.join(format!("{out_stem}.{in_stem}.bam")))
        })
        .collect()
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(OsStr::to_str)
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a file name from {}", path.display()))
}
