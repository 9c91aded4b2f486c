use crate::fields::{l_read_name, n_cigar_op, pos};

/// Read the CIGAR op word at byte `offset`.
///
/// The CIGAR offset (32 + `l_read_name`) is not guaranteed to be 4-byte aligned,
/// so the word is assembled bytewise.
#[inline]
fn cigar_op_at(bam: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bam[offset], bam[offset + 1], bam[offset + 2], bam[offset + 3]])
}

/// Compute reference length directly from raw CIGAR bytes (zero allocation).
///
/// This is the sum of M/D/N/=/X operations. Returns 0 when the record has no
/// CIGAR or the CIGAR runs past the end of the record.
#[inline]
#[must_use]
pub fn reference_length_from_raw_bam(bam: &[u8]) -> i32 {
    let n_cigar_op = n_cigar_op(bam) as usize;
    if n_cigar_op == 0 {
        return 0;
    }
    let cigar_start = 32 + l_read_name(bam) as usize;
    let cigar_end = cigar_start + n_cigar_op * 4;
    if cigar_end > bam.len() {
        return 0;
    }

    let mut ref_len = 0i32;
    for i in 0..n_cigar_op {
        let op = cigar_op_at(bam, cigar_start + i * 4);
        if matches!(op & 0xF, 0 | 2 | 3 | 7 | 8) {
            ref_len += (op >> 4).cast_signed();
        }
    }
    ref_len
}

/// Exclusive 0-based end of the aligned interval.
///
/// A record without reference-consuming operations still occupies its start
/// base, so its span is treated as one.
#[inline]
#[must_use]
pub fn alignment_end_exclusive(bam: &[u8]) -> i32 {
    pos(bam) + reference_length_from_raw_bam(bam).max(1)
}
