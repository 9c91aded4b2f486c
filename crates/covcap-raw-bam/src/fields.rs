//! Direct field extraction from BAM binary records.
//!
//! # BAM Record Binary Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0-3     4     refID (i32) - reference sequence ID
//! 4-7     4     pos (i32) - 0-based leftmost position
//! 8       1     l_read_name (u8) - length of read name + NUL
//! 9       1     mapq (u8) - mapping quality
//! 10-11   2     bin (u16) - BAM bin
//! 12-13   2     n_cigar_op (u16) - number of CIGAR operations
//! 14-15   2     flag (u16) - bitwise flags
//! 16-19   4     l_seq (u32) - length of sequence
//! 20-23   4     next_refID (i32) - mate reference sequence ID
//! 24-27   4     next_pos (i32) - mate 0-based position
//! 28-31   4     tlen (i32) - template length
//! 32+     var   read_name (l_read_name bytes, null-terminated)
//! ```
//!
//! The read primitives assume the record passed [`check_layout`]; shorter slices
//! panic on out-of-bounds indexing.

use thiserror::Error;

/// Length of the fixed-size portion of a BAM record.
pub const MIN_BAM_HEADER_LEN: usize = 32;

/// Byte offset of the first field after `refID` and `pos`.
///
/// Everything from here on is what an output framer receives as the record
/// payload; `refID` and `pos` are written separately.
pub const PAYLOAD_OFFSET: usize = 8;

/// BAM flag bits.
pub mod flags {
    /// Read is paired in sequencing.
    pub const PAIRED: u16 = 0x1;
    /// Read is unmapped.
    pub const UNMAPPED: u16 = 0x4;
    /// Mate is unmapped.
    pub const MATE_UNMAPPED: u16 = 0x8;
    /// Read is reverse complemented.
    pub const REVERSE: u16 = 0x10;
    /// Secondary alignment.
    pub const SECONDARY: u16 = 0x100;
    /// Not passing quality controls.
    pub const QC_FAIL: u16 = 0x200;
    /// PCR or optical duplicate.
    pub const DUPLICATE: u16 = 0x400;
    /// Supplementary alignment.
    pub const SUPPLEMENTARY: u16 = 0x800;
}

/// Structural problems detected in a raw record before any field is read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Record is shorter than the fixed 32-byte header.
    #[error("record is {len} bytes, shorter than the {MIN_BAM_HEADER_LEN}-byte fixed header")]
    TooShort {
        /// Actual record length.
        len: usize,
    },

    /// Read name length is zero (the NUL terminator is mandatory).
    #[error("l_read_name is 0; the read name must at least hold its NUL terminator")]
    EmptyReadName,

    /// Read name or CIGAR runs past the end of the record.
    #[error("variable-length fields need {needed} bytes but the record has {len}")]
    Truncated {
        /// Bytes required through the end of the CIGAR.
        needed: usize,
        /// Actual record length.
        len: usize,
    },
}

/// Verify that `bam` is long enough for every field this crate reads.
///
/// # Errors
///
/// Returns a [`LayoutError`] describing the first structural problem found.
pub fn check_layout(bam: &[u8]) -> Result<(), LayoutError> {
    if bam.len() < MIN_BAM_HEADER_LEN {
        return Err(LayoutError::TooShort { len: bam.len() });
    }
    let l_read_name = l_read_name(bam) as usize;
    if l_read_name == 0 {
        return Err(LayoutError::EmptyReadName);
    }
    let needed = MIN_BAM_HEADER_LEN + l_read_name + n_cigar_op(bam) as usize * 4;
    if needed > bam.len() {
        return Err(LayoutError::Truncated { needed, len: bam.len() });
    }
    Ok(())
}

// ============================================================================
// Read Primitives
// ============================================================================

/// Extract flags (u16) from a BAM record.
#[inline]
#[must_use]
pub fn flags(bam: &[u8]) -> u16 {
    u16::from_le_bytes([bam[14], bam[15]])
}

/// Extract reference sequence ID from a BAM record.
#[inline]
#[must_use]
pub fn ref_id(bam: &[u8]) -> i32 {
    i32::from_le_bytes([bam[0], bam[1], bam[2], bam[3]])
}

/// Extract 0-based leftmost position from a BAM record.
#[inline]
#[must_use]
pub fn pos(bam: &[u8]) -> i32 {
    i32::from_le_bytes([bam[4], bam[5], bam[6], bam[7]])
}

/// Extract `l_read_name` (length of read name + NUL) from a BAM record.
#[inline]
#[must_use]
pub fn l_read_name(bam: &[u8]) -> u8 {
    bam[8]
}

/// Extract number of CIGAR operations from a BAM record.
#[inline]
#[must_use]
pub fn n_cigar_op(bam: &[u8]) -> u16 {
    u16::from_le_bytes([bam[12], bam[13]])
}

/// Extract read name (without null terminator) from a BAM record.
#[inline]
#[must_use]
pub fn read_name(bam: &[u8]) -> &[u8] {
    let l = bam[8] as usize;
    if l > 1 { &bam[32..32 + l - 1] } else { &[] }
}

/// True if the unmapped flag (0x4) is clear.
#[inline]
#[must_use]
pub fn is_mapped(bam: &[u8]) -> bool {
    flags(bam) & flags::UNMAPPED == 0
}

/// True if the QC-fail flag (0x200) is set.
#[inline]
#[must_use]
pub fn is_qc_fail(bam: &[u8]) -> bool {
    flags(bam) & flags::QC_FAIL != 0
}

// ============================================================================
// Write Primitives
// ============================================================================

/// Set flags (u16) in a BAM record.
#[inline]
pub fn set_flags(bam: &mut [u8], new_flags: u16) {
    bam[14..16].copy_from_slice(&new_flags.to_le_bytes());
}

/// Set the QC-fail flag, leaving every other bit untouched.
#[inline]
pub fn set_qc_fail(bam: &mut [u8]) {
    let current = flags(bam);
    set_flags(bam, current | flags::QC_FAIL);
}
