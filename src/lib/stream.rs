//! Record source and sink seams for the coverage engine.
//!
//! The engine pulls records from a [`RecordSource`] one at a time and pushes
//! survivors to a [`RecordSink`]. BAM files implement both through
//! [`crate::bam_io`]; the in-memory versions here back the unit tests and
//! benchmarks.

use std::collections::VecDeque;
use std::io;

use crate::errors::Result;
use crate::record::AlignmentRecord;

/// Pull-based supply of alignment records in input order.
pub trait RecordSource {
    /// The next record, or `None` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be read or a record is
    /// malformed.
    fn next_record(&mut self) -> Result<Option<AlignmentRecord>>;
}

/// Destination for emitted records.
pub trait RecordSink {
    /// Write one record given its placement and the bytes that follow
    /// `refID`/`pos` in the raw layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output cannot be written.
    fn write_record(&mut self, ref_id: i32, pos: i32, payload: &[u8]) -> io::Result<()>;
}

impl<T: RecordSource + ?Sized> RecordSource for &mut T {
    fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
        (**self).next_record()
    }
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn write_record(&mut self, ref_id: i32, pos: i32, payload: &[u8]) -> io::Result<()> {
        (**self).write_record(ref_id, pos, payload)
    }
}

/// Source over raw record byte vectors held in memory.
#[derive(Debug, Default)]
pub struct VecSource {
    records: VecDeque<Vec<u8>>,
    records_read: u64,
}

impl VecSource {
    #[must_use]
    pub fn new(records: Vec<Vec<u8>>) -> Self {
        Self { records: records.into(), records_read: 0 }
    }
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> Result<Option<AlignmentRecord>> {
        match self.records.pop_front() {
            Some(bytes) => {
                self.records_read += 1;
                AlignmentRecord::from_bytes(bytes, self.records_read).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Sink that reassembles emitted records into full raw byte vectors.
#[derive(Debug, Default)]
pub struct VecSink {
    records: Vec<Vec<u8>>,
}

impl VecSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emitted records in emission order.
    #[must_use]
    pub fn records(&self) -> &[Vec<u8>] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Vec<u8>> {
        self.records
    }
}

impl RecordSink for VecSink {
    fn write_record(&mut self, ref_id: i32, pos: i32, payload: &[u8]) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(payload.len() + 8);
        bytes.extend_from_slice(&ref_id.to_le_bytes());
        bytes.extend_from_slice(&pos.to_le_bytes());
        bytes.extend_from_slice(payload);
        self.records.push(bytes);
        Ok(())
    }
}
