//! Builder for raw BAM record bytes, for tests and benchmarks.

/// Builds the raw bytes of a BAM record (without the `block_size` prefix).
///
/// Defaults to a mapped, unpaired record on reference 0 at position 0 with no
/// CIGAR, no sequence and no aux data.
#[derive(Debug, Clone)]
pub struct RawRecordBuilder {
    name: Vec<u8>,
    ref_id: i32,
    pos: i32,
    mapq: u8,
    flags: u16,
    cigar: Vec<(u8, u32)>,
    seq_len: usize,
}

/// Map a CIGAR operation character to its BAM code.
fn cigar_code(op: u8) -> u32 {
    match op {
        b'M' => 0,
        b'I' => 1,
        b'D' => 2,
        b'N' => 3,
        b'S' => 4,
        b'H' => 5,
        b'P' => 6,
        b'=' => 7,
        b'X' => 8,
        _ => panic!("Unknown CIGAR operation: {}", op as char),
    }
}

impl RawRecordBuilder {
    /// Start a record with the given read name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.as_bytes().to_vec(),
            ref_id: 0,
            pos: 0,
            mapq: 60,
            flags: 0,
            cigar: Vec::new(),
            seq_len: 0,
        }
    }

    #[must_use]
    pub fn ref_id(mut self, ref_id: i32) -> Self {
        self.ref_id = ref_id;
        self
    }

    #[must_use]
    pub fn pos(mut self, pos: i32) -> Self {
        self.pos = pos;
        self
    }

    #[must_use]
    pub fn mapq(mut self, mapq: u8) -> Self {
        self.mapq = mapq;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    /// CIGAR as `(op, len)` pairs, e.g. `&[(b'M', 50)]`.
    #[must_use]
    pub fn cigar(mut self, ops: &[(u8, u32)]) -> Self {
        self.cigar = ops.to_vec();
        self
    }

    /// Add an all-`A` sequence with matching qualities of the given length.
    #[must_use]
    pub fn seq_len(mut self, len: usize) -> Self {
        self.seq_len = len;
        self
    }

    /// Encode the record.
    ///
    /// # Panics
    ///
    /// Panics if the name or CIGAR exceeds the BAM field widths.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let l_read_name = u8::try_from(self.name.len() + 1).expect("read name too long");
        let n_cigar_op = u16::try_from(self.cigar.len()).expect("too many CIGAR ops");
        let l_seq = u32::try_from(self.seq_len).expect("sequence too long");

        let mut out = Vec::with_capacity(32 + self.name.len() + 1 + self.cigar.len() * 4);
        out.extend_from_slice(&self.ref_id.to_le_bytes());
        out.extend_from_slice(&self.pos.to_le_bytes());
        out.push(l_read_name);
        out.push(self.mapq);
        out.extend_from_slice(&0u16.to_le_bytes()); // bin
        out.extend_from_slice(&n_cigar_op.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&l_seq.to_le_bytes());
        out.extend_from_slice(&(-1i32).to_le_bytes()); // next_refID
        out.extend_from_slice(&(-1i32).to_le_bytes()); // next_pos
        out.extend_from_slice(&0i32.to_le_bytes()); // tlen
        out.extend_from_slice(&self.name);
        out.push(0);
        for &(op, len) in &self.cigar {
            out.extend_from_slice(&((len << 4) | cigar_code(op)).to_le_bytes());
        }
        // 'A' is 1 in the 4-bit encoding
        out.extend(std::iter::repeat_n(0x11u8, self.seq_len.div_ceil(2)));
        out.extend(std::iter::repeat_n(30u8, self.seq_len));
        out
    }
}
