//! Common CLI options shared across commands.
//!
//! These argument structures are composed into command structs using
//! `#[command(flatten)]`.

use anyhow::Result;
use clap::Args;
use noodles::sam::Header;

use covcap_lib::bgzf_writer::{MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL};
use covcap_lib::validation::validate_range;

use crate::version::VERSION;

/// Options for output compression.
#[derive(Debug, Clone, Args)]
pub struct CompressionOptions {
    /// Compression level for output BAM (1-12).
    ///
    /// Level 1 is fastest with larger files.
    /// Level 12 produces smallest files but is slowest.
    #[arg(long, default_value_t = 1)]
    pub compression_level: u32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { compression_level: 1 }
    }
}

impl CompressionOptions {
    /// # Errors
    ///
    /// Returns an error if the level is outside 1-12.
    pub fn validate(&self) -> Result<()> {
        validate_range(
            self.compression_level,
            MIN_COMPRESSION_LEVEL,
            MAX_COMPRESSION_LEVEL,
            "compression-level",
        )?;
        Ok(())
    }
}

/// Options for input decompression threads.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of threads for BGZF decompression of the input.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl ThreadingOptions {
    /// # Errors
    ///
    /// Returns an error if the thread count is zero.
    pub fn validate(&self) -> Result<()> {
        covcap_lib::validation::validate_positive(self.threads, "threads")?;
        Ok(())
    }
}

/// Add this program's @PG record, chained to the input's last program.
///
/// # Errors
///
/// Returns an error if the record cannot be added to the header.
pub fn add_pg_record(header: Header, command_line: &str) -> Result<Header> {
    covcap_lib::header::add_pg_record(header, VERSION, command_line)
}
