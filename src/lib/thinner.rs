//! Streaming coverage capping over a coordinate-sorted record stream.
//!
//! [`CoverageThinner`] walks the input one record at a time. For each record
//! (the "current" record) it keeps every earlier record that could still
//! overlap it in a [`WindowBuffer`], pulls later records until none can start
//! inside the current interval, estimates the depth at the current record's two
//! ends and makes a deterministic keep/drop decision when that depth exceeds
//! the cap. Records leave the window strictly from the left, so the output is
//! in input order.
//!
//! ```text
//!   leftmost            current                 rightmost
//!      |                   |                        |
//!      v                   v                        v
//!   [ reaped when they end before current ][ current ... records starting <= current.end ]
//! ```
//!
//! Unmapped and QC-fail records are carried through without a decision. When
//! the window grows to `passthrough_factor * max_cov` entries the current
//! record is emitted unevaluated and everything to its left is flushed, which
//! bounds memory over pathological pileups.

use log::debug;

use crate::errors::{CovcapError, Result};
use crate::metrics::SubsampleMetrics;
use crate::progress::ProgressTracker;
use crate::record::{AlignmentRecord, DecisionState, Status};
use crate::sampler::should_keep;
use crate::stream::{RecordSink, RecordSource};
use crate::window::WindowBuffer;

/// Default multiple of `max_cov` at which the window stops growing.
pub const DEFAULT_PASSTHROUGH_FACTOR: u32 = 20;

/// Parameters for one subsampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinnerConfig {
    /// Target maximum coverage; must be positive.
    pub max_cov: u32,
    /// Omit dropped records instead of flagging them QC-fail.
    pub remove: bool,
    /// Window cap as a multiple of `max_cov`; `0` disables the cap.
    pub passthrough_factor: u32,
}

impl ThinnerConfig {
    #[must_use]
    pub fn new(max_cov: u32) -> Self {
        Self { max_cov, remove: false, passthrough_factor: DEFAULT_PASSTHROUGH_FACTOR }
    }

    #[must_use]
    pub fn with_remove(mut self, remove: bool) -> Self {
        self.remove = remove;
        self
    }

    #[must_use]
    pub fn with_passthrough_factor(mut self, factor: u32) -> Self {
        self.passthrough_factor = factor;
        self
    }

    /// Window size at which records pass through unevaluated, if capped.
    #[must_use]
    pub fn passthrough_cap(&self) -> Option<usize> {
        if self.passthrough_factor == 0 {
            None
        } else {
            let cap = u64::from(self.passthrough_factor) * u64::from(self.max_cov);
            Some(usize::try_from(cap).unwrap_or(usize::MAX))
        }
    }
}

/// Placement of the most recently admitted record, for sort validation.
#[derive(Debug, Clone, Copy)]
struct Placement {
    ref_id: i32,
    pos: i32,
}

/// Placement of the current record, copied out of the window.
#[derive(Debug, Clone, Copy)]
struct Focus {
    ref_id: i32,
    start_pos: i32,
    end_pos: i32,
    start_loc: i32,
    end_loc: i32,
    evaluable: bool,
}

impl Focus {
    fn of(record: &AlignmentRecord) -> Self {
        Self {
            ref_id: record.ref_id(),
            start_pos: record.start_pos(),
            end_pos: record.end_pos(),
            start_loc: record.start_loc(),
            end_loc: record.end_loc(),
            evaluable: record.is_mapped() && !record.is_qc_fail() && record.ref_id() >= 0,
        }
    }
}

/// The windowed coverage-capping engine.
pub struct CoverageThinner<S, K> {
    config: ThinnerConfig,
    source: S,
    sink: K,
    window: WindowBuffer<DecisionState>,
    metrics: SubsampleMetrics,
    last_admitted: Option<Placement>,
    progress: Option<ProgressTracker>,
}

impl<S: RecordSource, K: RecordSink> CoverageThinner<S, K> {
    /// Build an engine reading from `source` and emitting to `sink`.
    ///
    /// # Panics
    ///
    /// Panics if `config.max_cov` is zero.
    pub fn new(config: ThinnerConfig, source: S, sink: K) -> Self {
        assert!(config.max_cov > 0, "max_cov must be positive");
        Self {
            config,
            source,
            sink,
            window: WindowBuffer::new(),
            metrics: SubsampleMetrics::default(),
            last_admitted: None,
            progress: None,
        }
    }

    /// Label the metrics with the input name.
    #[must_use]
    pub fn with_input_name(mut self, input: impl Into<String>) -> Self {
        self.metrics = SubsampleMetrics::new(input);
        self
    }

    /// Log progress every time the tracker's interval of records is read.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Process the whole input and return the sink and statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CovcapError::UnsortedInput`] at the first out-of-order record,
    /// or any error raised by the source or sink. Records still in the window
    /// at that point are not emitted.
    pub fn run(mut self) -> Result<(K, SubsampleMetrics)> {
        let mut current: u64 = 0;
        loop {
            if current == self.window.end_index() && !self.admit()? {
                break;
            }
            let focus = Focus::of(self.window.get(current).record());
            self.reap_before(current, focus)?;

            if self.at_passthrough_cap() {
                self.pass_through(current, focus)?;
            } else if focus.evaluable {
                if self.extend(focus)? {
                    self.evaluate(current, focus);
                } else {
                    self.pass_through(current, focus)?;
                }
            }
            current += 1;
        }

        while !self.window.is_empty() {
            self.reap_leftmost()?;
        }

        if let Some(progress) = &self.progress {
            progress.log_final();
        }
        self.metrics.peak_window_size = self.window.peak_len() as u64;
        Ok((self.sink, self.metrics))
    }

    /// Pull one record into the window. Returns `false` at end of input.
    fn admit(&mut self) -> Result<bool> {
        let Some(record) = self.source.next_record()? else {
            return Ok(false);
        };
        self.check_order(&record)?;

        self.metrics.total_records += 1;
        if record.is_mapped() {
            self.metrics.mapped_records += 1;
        } else {
            self.metrics.unmapped_records += 1;
        }
        if record.is_qc_fail() {
            self.metrics.qc_fail_records += 1;
        }
        if let Some(progress) = &self.progress {
            progress.log_if_needed(1);
        }

        self.window.push(DecisionState::new(record));
        Ok(true)
    }

    /// Reject a record that sorts before the previously admitted one.
    ///
    /// Unplaced records (`ref_id == -1`) sort after every placed record.
    fn check_order(&mut self, record: &AlignmentRecord) -> Result<()> {
        let next = Placement { ref_id: record.ref_id(), pos: record.start_pos() };
        if let Some(prev) = self.last_admitted {
            let in_order = match (prev.ref_id < 0, next.ref_id < 0) {
                (_, true) => true,
                (true, false) => false,
                (false, false) => {
                    next.ref_id > prev.ref_id || (next.ref_id == prev.ref_id && next.pos >= prev.pos)
                }
            };
            if !in_order {
                return Err(CovcapError::UnsortedInput {
                    read_name: String::from_utf8_lossy(record.read_name()).into_owned(),
                    ref_id: next.ref_id,
                    pos: next.pos,
                    previous_ref_id: prev.ref_id,
                    previous_pos: prev.pos,
                });
            }
        }
        self.last_admitted = Some(next);
        Ok(())
    }

    fn at_passthrough_cap(&self) -> bool {
        self.config.passthrough_cap().is_some_and(|cap| self.window.len() >= cap)
    }

    /// Evict records left of `current` that can no longer overlap it.
    fn reap_before(&mut self, current: u64, focus: Focus) -> Result<()> {
        while let Some(left) = self.window.leftmost() {
            if left >= current {
                break;
            }
            let record = self.window.get(left).record();
            let done = !record.is_mapped()
                || record.ref_id() != focus.ref_id
                || record.end_pos() < focus.start_pos;
            if !done {
                break;
            }
            self.reap_leftmost()?;
        }
        Ok(())
    }

    /// Pull records that may overlap the current one.
    ///
    /// Returns `false` if the window reached the pass-through cap first.
    fn extend(&mut self, focus: Focus) -> Result<bool> {
        loop {
            let Some(right) = self.window.rightmost() else {
                return Ok(true);
            };
            let newest = self.window.get(right).record();
            if newest.ref_id() != focus.ref_id || newest.start_pos() > focus.end_pos {
                return Ok(true);
            }
            if self.at_passthrough_cap() {
                return Ok(false);
            }
            if !self.admit()? {
                return Ok(true);
            }
        }
    }

    /// Depth at the current record's first and last covered base.
    fn coverage(&self, focus: Focus) -> u32 {
        let (mut ldepth, mut rdepth) = (0u32, 0u32);
        for state in self.window.iter() {
            let record = state.record();
            if !record.is_mapped() || record.is_qc_fail() || record.ref_id() != focus.ref_id {
                continue;
            }
            if record.covers(focus.ref_id, focus.start_loc) {
                ldepth += 1;
            }
            if record.covers(focus.ref_id, focus.end_loc) {
                rdepth += 1;
            }
        }
        ldepth.max(rdepth)
    }

    fn evaluate(&mut self, current: u64, focus: Focus) {
        let coverage = self.coverage(focus);
        let max_cov = self.config.max_cov;
        self.metrics.evaluated_records += 1;
        self.metrics.max_coverage = self.metrics.max_coverage.max(coverage);

        let state = self.window.get_mut(current);
        let keep = if coverage > max_cov {
            self.metrics.over_cap_records += 1;
            should_keep(state.record().read_name(), coverage, max_cov)
        } else {
            true
        };
        state.decide(keep);
        if keep {
            self.metrics.kept_records += 1;
        } else {
            self.metrics.dropped_records += 1;
        }
    }

    /// Emit `current` unevaluated and flush everything to its left.
    ///
    /// Only records that would otherwise have been evaluated are counted.
    fn pass_through(&mut self, current: u64, focus: Focus) -> Result<()> {
        if focus.evaluable {
            self.metrics.passthrough_records += 1;
            if self.metrics.passthrough_records == 1 {
                debug!(
                    "Window reached {} records ({} slots); passing records through unevaluated",
                    self.window.len(),
                    self.window.capacity()
                );
            }
        }
        while self.window.leftmost().is_some_and(|left| left < current) {
            self.reap_leftmost()?;
        }
        Ok(())
    }

    /// Evict the leftmost record and emit, flag or discard it.
    fn reap_leftmost(&mut self) -> Result<()> {
        let Some(mut state) = self.window.pop_front() else {
            return Ok(());
        };
        let status = state.resolve();
        let mut record = state.into_record();

        if status == Status::Drop {
            if self.config.remove {
                self.metrics.removed_records += 1;
                return Ok(());
            }
            record.set_qc_fail();
            self.metrics.flagged_records += 1;
        }
        self.sink.write_record(record.ref_id(), record.start_pos(), record.payload())?;
        self.metrics.emitted_records += 1;
        Ok(())
    }
}
