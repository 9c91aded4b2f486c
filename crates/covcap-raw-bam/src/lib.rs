#![deny(unsafe_code)]

//! Zero-copy field access for raw BAM alignment records.
//!
//! Records handled here are the bytes that follow the 4-byte `block_size`
//! prefix in a decompressed BAM stream. Nothing is decoded eagerly: each
//! accessor reads the field straight out of the fixed-offset layout.

pub mod cigar;
pub mod fields;

#[cfg(any(test, feature = "test-utils"))]
pub mod testutil;

// Flat re-exports: callers use covcap_raw_bam::flags() etc.
pub use cigar::*;
pub use fields::*;

#[cfg(any(test, feature = "test-utils"))]
pub use testutil::*;
