//! Raw BAM input and output.
//!
//! The header is parsed with noodles; records are then moved as raw bytes in
//! both directions so that nothing but the flag word is ever rewritten.
//!
//! # Threading Model
//!
//! Input decompression can use noodles' multi-threaded BGZF reader
//! (`threads > 1`). Output is compressed inline on the calling thread with
//! libdeflate, one block at a time.

use anyhow::{Context, Result};
use noodles::sam::Header;
use noodles_bgzf::io::{MultithreadedReader, Reader as BgzfReader};
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::num::NonZero;
use std::path::Path;

use crate::bgzf_writer::BgzfBlockWriter;
use crate::errors::Result as CovcapResult;
use crate::record::AlignmentRecord;
use crate::stream::{RecordSink, RecordSource};

/// BAM magic bytes.
const BAM_MAGIC: &[u8; 4] = b"BAM\x01";

/// Either a single-threaded or a multi-threaded BGZF reader.
pub enum BgzfReaderEnum {
    /// Single-threaded BGZF reader (lower overhead for small files)
    SingleThreaded(BgzfReader<File>),
    /// Multi-threaded BGZF reader (noodles built-in threading)
    MultiThreaded(MultithreadedReader<File>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// Reads `block_size`-prefixed raw records from a decompressed BAM stream
/// positioned just past the header.
pub struct RawBamReader<R> {
    inner: R,
    records_read: u64,
}

impl<R: Read> RawBamReader<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self { inner, records_read: 0 }
    }

    /// Number of records returned so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the next record's bytes, or `None` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream ends inside a record.
    pub fn read_raw_record(&mut self) -> io::Result<Option<Vec<u8>>> {
        let Some(block_size) = self.read_block_size()? else {
            return Ok(None);
        };
        let mut bytes = vec![0u8; block_size];
        self.inner.read_exact(&mut bytes)?;
        self.records_read += 1;
        Ok(Some(bytes))
    }

    fn read_block_size(&mut self) -> io::Result<Option<usize>> {
        let mut buf = [0u8; 4];
        loop {
            match self.inner.read(&mut buf[..1]) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.inner.read_exact(&mut buf[1..])?;
        usize::try_from(u32::from_le_bytes(buf))
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl<R: Read> RecordSource for RawBamReader<R> {
    fn next_record(&mut self) -> CovcapResult<Option<AlignmentRecord>> {
        match self.read_raw_record()? {
            Some(bytes) => AlignmentRecord::from_bytes(bytes, self.records_read).map(Some),
            None => Ok(None),
        }
    }
}

/// Open a BAM file, parse its header, and return a raw record reader.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the header cannot be read.
pub fn create_raw_bam_reader<P: AsRef<Path>>(
    path: P,
    threads: usize,
) -> Result<(RawBamReader<BgzfReaderEnum>, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let bgzf_reader = match NonZero::new(threads) {
        Some(worker_count) if threads > 1 => {
            BgzfReaderEnum::MultiThreaded(MultithreadedReader::with_worker_count(worker_count, file))
        }
        _ => BgzfReaderEnum::SingleThreaded(BgzfReader::new(file)),
    };

    let mut noodles_reader = noodles::bam::io::Reader::from(bgzf_reader);
    let header = noodles_reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((RawBamReader::new(noodles_reader.into_inner()), header))
}

/// Writes a BAM header and raw records through an inline BGZF compressor.
pub struct RawBamWriter<W: Write> {
    inner: BgzfBlockWriter<W>,
}

impl<W: Write> RawBamWriter<W> {
    #[must_use]
    pub fn new(inner: BgzfBlockWriter<W>) -> Self {
        Self { inner }
    }

    /// Write the magic, header text and reference dictionary.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be serialized or written.
    pub fn write_header(&mut self, header: &Header) -> io::Result<()> {
        self.inner.write_all(BAM_MAGIC)?;

        let mut sam_writer = noodles::sam::io::Writer::new(Vec::new());
        sam_writer.write_header(header)?;
        let text = sam_writer.into_inner();
        self.inner.write_all(&to_i32(text.len(), "header text length")?.to_le_bytes())?;
        self.inner.write_all(&text)?;

        let references = header.reference_sequences();
        self.inner.write_all(&to_i32(references.len(), "reference count")?.to_le_bytes())?;
        for (name, map) in references {
            let l_name = u32::try_from(name.len() + 1)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            self.inner.write_all(&l_name.to_le_bytes())?;
            self.inner.write_all(name)?;
            self.inner.write_all(&[0u8])?;
            self.inner.write_all(&to_i32(map.length().get(), "reference length")?.to_le_bytes())?;
        }
        Ok(())
    }

    /// Write the final block and the BGZF EOF marker.
    ///
    /// # Errors
    ///
    /// Returns an error if finalizing the stream fails.
    pub fn finish(self) -> io::Result<W> {
        self.inner.finish()
    }
}

impl<W: Write> RecordSink for RawBamWriter<W> {
    /// Frames the record as `block_size`, `refID`, `pos`, then the payload.
    fn write_record(&mut self, ref_id: i32, pos: i32, payload: &[u8]) -> io::Result<()> {
        let block_size = u32::try_from(payload.len() + 8)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.inner.write_all(&block_size.to_le_bytes())?;
        self.inner.write_all(&ref_id.to_le_bytes())?;
        self.inner.write_all(&pos.to_le_bytes())?;
        self.inner.write_all(payload)
    }
}

fn to_i32(value: usize, what: &str) -> io::Result<i32> {
    i32::try_from(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("{what} too large: {value}")))
}

/// Create `path`, write `header`, and return a raw record writer.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the header cannot be written.
pub fn create_raw_bam_writer<P: AsRef<Path>>(
    path: P,
    header: &Header,
    compression_level: u32,
) -> Result<RawBamWriter<File>> {
    let path_ref = path.as_ref();
    let output_file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;

    let mut writer = RawBamWriter::new(BgzfBlockWriter::new(output_file, compression_level)?);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;
    Ok(writer)
}
