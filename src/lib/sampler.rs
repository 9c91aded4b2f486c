//! Deterministic keep/drop decisions for over-covered records.
//!
//! Every record whose estimated coverage exceeds the cap is dropped with
//! probability `(coverage - cap) / coverage`, so the expected number of
//! survivors at that depth equals the cap. The "random" draw is derived from
//! the read name alone, which makes runs reproducible and gives both mates of
//! a pair the same draw.

use murmur3::murmur3_32;

/// Seed for the read-name hash.
pub const READ_NAME_HASH_SEED: u32 = 42;

/// Number of low hash bits turned into the uniform draw.
const DRAW_BITS: u32 = 24;
const DRAW_MASK: u32 = (1 << DRAW_BITS) - 1;
const DRAW_SCALE: f64 = (1u32 << DRAW_BITS) as f64;

/// Uniform value in `[0, 1)` derived from the low 24 bits of the read-name hash.
#[must_use]
pub fn hash_fraction(read_name: &[u8]) -> f64 {
    let hash = murmur3_32(&mut std::io::Cursor::new(read_name), READ_NAME_HASH_SEED).unwrap_or(0);
    f64::from(hash & DRAW_MASK) / DRAW_SCALE
}

/// Probability of dropping a record seen at `coverage` with cap `max_cov`.
///
/// Zero at or below the cap.
#[must_use]
pub fn drop_probability(coverage: u32, max_cov: u32) -> f64 {
    if coverage <= max_cov {
        return 0.0;
    }
    f64::from(coverage - max_cov) / f64::from(coverage)
}

/// Decide whether to keep a record.
///
/// Records at or below the cap are always kept without hashing.
#[must_use]
pub fn should_keep(read_name: &[u8], coverage: u32, max_cov: u32) -> bool {
    if coverage <= max_cov {
        return true;
    }
    hash_fraction(read_name) >= drop_probability(coverage, max_cov)
}
