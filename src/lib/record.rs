//! Alignment records and their subsampling decision state.
//!
//! [`AlignmentRecord`] owns the raw BAM bytes of one alignment and caches the
//! handful of fields the coverage engine reads on every comparison. The bytes
//! are only touched again when the record is emitted.
//!
//! [`DecisionState`] pairs a record with its [`Status`]. The status moves
//! `Unknown -> Keep | Drop -> Resolved`, or `Unknown -> Resolved` for records
//! that never get a decision (unmapped, QC-fail, passed through). Any other
//! transition is a logic error and panics.

use std::fmt;

use covcap_raw_bam as raw;

use crate::errors::{CovcapError, Result};

/// One alignment record held as raw BAM bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    bytes: Vec<u8>,
    ref_id: i32,
    start_pos: i32,
    end_pos: i32,
    flags: u16,
}

impl AlignmentRecord {
    /// Wrap raw BAM record bytes (without the `block_size` prefix).
    ///
    /// `record_number` is only used to label the error for malformed input.
    ///
    /// # Errors
    ///
    /// Returns [`CovcapError::MalformedRecord`] if the bytes are too short for
    /// the fixed header, read name, or CIGAR.
    pub fn from_bytes(bytes: Vec<u8>, record_number: u64) -> Result<Self> {
        raw::check_layout(&bytes)
            .map_err(|source| CovcapError::MalformedRecord { record_number, source })?;

        Ok(Self {
            ref_id: raw::ref_id(&bytes),
            start_pos: raw::pos(&bytes),
            end_pos: raw::alignment_end_exclusive(&bytes),
            flags: raw::flags(&bytes),
            bytes,
        })
    }

    /// Reference sequence id, `-1` for unplaced records.
    #[inline]
    #[must_use]
    pub fn ref_id(&self) -> i32 {
        self.ref_id
    }

    /// 0-based leftmost aligned position.
    #[inline]
    #[must_use]
    pub fn start_pos(&self) -> i32 {
        self.start_pos
    }

    /// Exclusive 0-based end of the aligned interval.
    #[inline]
    #[must_use]
    pub fn end_pos(&self) -> i32 {
        self.end_pos
    }

    /// First reference base covered, used as the left coverage probe.
    #[inline]
    #[must_use]
    pub fn start_loc(&self) -> i32 {
        self.start_pos
    }

    /// Last reference base covered, used as the right coverage probe.
    #[inline]
    #[must_use]
    pub fn end_loc(&self) -> i32 {
        self.end_pos - 1
    }

    #[inline]
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        self.flags & raw::flags::UNMAPPED == 0
    }

    #[inline]
    #[must_use]
    pub fn is_qc_fail(&self) -> bool {
        self.flags & raw::flags::QC_FAIL != 0
    }

    /// True if `loc` lies on the same reference and inside `[start_pos, end_pos)`.
    #[inline]
    #[must_use]
    pub fn covers(&self, ref_id: i32, loc: i32) -> bool {
        self.ref_id == ref_id && self.start_pos <= loc && loc < self.end_pos
    }

    /// Read name without the NUL terminator.
    #[must_use]
    pub fn read_name(&self) -> &[u8] {
        raw::read_name(&self.bytes)
    }

    /// The full raw record.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Everything after `refID` and `pos`, as handed to the output framer.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[raw::PAYLOAD_OFFSET..]
    }

    /// Set the QC-fail flag in both the cached flags and the raw bytes.
    pub fn set_qc_fail(&mut self) {
        raw::set_qc_fail(&mut self.bytes);
        self.flags |= raw::flags::QC_FAIL;
    }

    /// Consume the record and return its raw bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentRecord")
            .field("read_name", &String::from_utf8_lossy(self.read_name()))
            .field("ref_id", &self.ref_id)
            .field("start_pos", &self.start_pos)
            .field("end_pos", &self.end_pos)
            .field("flags", &format_args!("{:#06x}", self.flags))
            .finish_non_exhaustive()
    }
}

/// Lifecycle of a record inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Admitted, no decision yet.
    Unknown,
    /// Decided to keep.
    Keep,
    /// Decided to drop (flag or remove at emission).
    Drop,
    /// Evicted from the window; must not be read again.
    Resolved,
}

/// A record plus its mutable subsampling status.
#[derive(Debug, Clone)]
pub struct DecisionState {
    record: AlignmentRecord,
    status: Status,
}

impl DecisionState {
    /// Wrap a freshly admitted record with status [`Status::Unknown`].
    #[must_use]
    pub fn new(record: AlignmentRecord) -> Self {
        Self { record, status: Status::Unknown }
    }

    #[inline]
    #[must_use]
    pub fn record(&self) -> &AlignmentRecord {
        &self.record
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Record the keep/drop decision.
    ///
    /// # Panics
    ///
    /// Panics unless the state is still [`Status::Unknown`].
    pub fn decide(&mut self, keep: bool) {
        assert_eq!(
            self.status,
            Status::Unknown,
            "decision already made for {:?}",
            self.record
        );
        self.status = if keep { Status::Keep } else { Status::Drop };
    }

    /// Mark the state resolved and hand back the record for emission.
    ///
    /// Returns the status held just before resolution.
    ///
    /// # Panics
    ///
    /// Panics if the state was already resolved.
    pub fn resolve(&mut self) -> Status {
        assert_ne!(self.status, Status::Resolved, "record resolved twice: {:?}", self.record);
        std::mem::replace(&mut self.status, Status::Resolved)
    }

    /// Consume the state, returning the record.
    #[must_use]
    pub fn into_record(self) -> AlignmentRecord {
        self.record
    }
}
