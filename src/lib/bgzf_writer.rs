//! Single-threaded BGZF output.
//!
//! [`BgzfBlockWriter`] buffers uncompressed bytes up to one BGZF block, compresses
//! each full block with libdeflate (via the `bgzf` crate) and writes it straight
//! to the wrapped writer. [`BgzfBlockWriter::finish`] flushes the partial block
//! and appends the standard EOF marker block.

use bgzf::{CompressionLevel, Compressor as BgzfCompressor};
use std::io::{self, Write};

/// Maximum uncompressed size for a BGZF block (64KB - header/footer overhead).
pub const BGZF_MAX_BLOCK_SIZE: usize = bgzf::BGZF_BLOCK_SIZE;

/// The empty BGZF block that terminates every BGZF file.
pub const BGZF_EOF: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Lowest accepted compression level.
pub const MIN_COMPRESSION_LEVEL: u32 = 1;
/// Highest accepted compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 12;

/// Streaming BGZF compressor writing whole blocks to `W`.
pub struct BgzfBlockWriter<W: Write> {
    inner: W,
    /// Uncompressed bytes of the block being filled.
    buffer: Vec<u8>,
    /// Scratch space for the compressed block, reused across blocks.
    compressed: Vec<u8>,
    compressor: BgzfCompressor,
    blocks_written: u64,
}

impl<W: Write> BgzfBlockWriter<W> {
    /// Wrap `inner`, compressing at `compression_level` (clamped to 1-12).
    ///
    /// # Errors
    ///
    /// Returns an error if the `bgzf` crate rejects the level.
    pub fn new(inner: W, compression_level: u32) -> io::Result<Self> {
        let level = compression_level.clamp(MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL);
        let level = u8::try_from(level).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let level = CompressionLevel::new(level).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid compression level: {e}"))
        })?;
        Ok(Self {
            inner,
            buffer: Vec::with_capacity(BGZF_MAX_BLOCK_SIZE),
            compressed: Vec::new(),
            compressor: BgzfCompressor::new(level),
            blocks_written: 0,
        })
    }

    /// Number of data blocks written so far (excluding the EOF block).
    #[must_use]
    pub fn blocks_written(&self) -> u64 {
        self.blocks_written
    }

    /// Compress the buffered bytes into one block and write it.
    fn write_block(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.compressed.clear();
        self.compressor
            .compress(&self.buffer, &mut self.compressed)
            .map_err(|e| io::Error::other(format!("BGZF compression failed: {e}")))?;
        self.inner.write_all(&self.compressed)?;
        self.buffer.clear();
        self.blocks_written += 1;
        Ok(())
    }

    /// Write the final partial block and the EOF marker, then return the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or writing fails.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_block()?;
        log::debug!("Wrote {} BGZF blocks", self.blocks_written());
        self.inner.write_all(&BGZF_EOF)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for BgzfBlockWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = BGZF_MAX_BLOCK_SIZE - self.buffer.len();
        let n = room.min(buf.len());
        self.buffer.extend_from_slice(&buf[..n]);
        if self.buffer.len() >= BGZF_MAX_BLOCK_SIZE {
            self.write_block()?;
        }
        Ok(n)
    }

    /// Flushes the underlying writer only.
    ///
    /// A partial block stays buffered so that blocks are only cut when full
    /// or at [`BgzfBlockWriter::finish`].
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
