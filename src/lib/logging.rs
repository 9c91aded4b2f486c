//! Formatting helpers and summary logging.

use std::time::{Duration, Instant};

use crate::metrics::SubsampleMetrics;

/// Formats an integer with thousands separators.
///
/// ```
/// use covcap_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage.
///
/// ```
/// use covcap_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as e.g. "45s", "2m 15s" or "1h 30m".
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput in records per second (or per minute when slow).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} records/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} records/s", format_count(rate as u64))
    } else {
        format!("{:.1} records/min", count as f64 / (secs / 60.0))
    }
}

/// Logs the per-file subsampling summary.
pub fn log_subsample_summary(metrics: &SubsampleMetrics) {
    log::info!("Subsampling Summary for {}:", metrics.input);
    log::info!("  Input records: {}", format_count(metrics.total_records));
    log::info!(
        "  Mapped / unmapped / QC-fail: {} / {} / {}",
        format_count(metrics.mapped_records),
        format_count(metrics.unmapped_records),
        format_count(metrics.qc_fail_records)
    );
    log::info!("  Evaluated records: {}", format_count(metrics.evaluated_records));
    log::info!("  Over coverage cap: {}", format_count(metrics.over_cap_records));
    log::info!("  Kept: {}", format_count(metrics.kept_records));
    log::info!(
        "  Dropped: {} ({} of evaluated)",
        format_count(metrics.dropped_records),
        format_percent(metrics.drop_fraction(), 2)
    );
    if metrics.removed_records > 0 {
        log::info!("  Removed from output: {}", format_count(metrics.removed_records));
    }
    if metrics.flagged_records > 0 {
        log::info!("  Flagged QC-fail: {}", format_count(metrics.flagged_records));
    }
    log::info!("  Written: {}", format_count(metrics.emitted_records));
    log::info!("  Max coverage seen: {}", metrics.max_coverage);
    log::info!("  Peak window size: {}", format_count(metrics.peak_window_size));
    if metrics.passthrough_records > 0 {
        log::warn!(
            "{} records were passed through unevaluated because the window reached its size cap",
            format_count(metrics.passthrough_records)
        );
    }
}

/// Logs an operation's start, then its elapsed time and rate on completion.
///
/// ```no_run
/// use covcap_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Subsampling reads");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
