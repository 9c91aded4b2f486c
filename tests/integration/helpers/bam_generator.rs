//! Utilities for generating test BAM data programmatically.

use bstr::BString;
use noodles::bam;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::header::tag::Tag as HeaderTag;
use noodles::sam::header::record::value::map::{Header as HeaderRecord, ReferenceSequence};
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

/// Creates a header with the given references and `SO` value.
pub fn create_header(references: &[(&str, usize)], sort_order: &str) -> Header {
    let HeaderTag::Other(sort_order_tag) = HeaderTag::from([b'S', b'O']) else { unreachable!() };

    let header_map = Map::<HeaderRecord>::builder()
        .insert(sort_order_tag, sort_order)
        .build()
        .expect("valid header map");

    let mut builder = Header::builder().set_header(header_map);
    for (name, length) in references {
        builder = builder.add_reference_sequence(
            BString::from(*name),
            Map::<ReferenceSequence>::new(
                NonZeroUsize::new(*length).expect("reference length must be non-zero"),
            ),
        );
    }
    builder.build()
}

/// Creates a coordinate-sorted header with `chr1` (10kb) and `chr2` (5kb).
pub fn create_coordinate_header() -> Header {
    create_header(&[("chr1", 10_000), ("chr2", 5_000)], "coordinate")
}

/// Creates a mapped read with an `<len>M` alignment starting at the 1-based `start`.
pub fn mapped_read(name: &str, ref_id: usize, start: usize, len: usize) -> RecordBuf {
    let mut record = RecordBuf::default();
    *record.name_mut() = Some(name.into());
    *record.flags_mut() = Flags::empty();
    *record.reference_sequence_id_mut() = Some(ref_id);
    *record.alignment_start_mut() = Some(Position::try_from(start).expect("start must be >= 1"));
    *record.mapping_quality_mut() = MappingQuality::new(60);
    *record.cigar_mut() = [Op::new(Kind::Match, len)].into_iter().collect();
    *record.sequence_mut() = Sequence::from(b"ACGT".iter().copied().cycle().take(len).collect::<Vec<_>>());
    *record.quality_scores_mut() = QualityScores::from(vec![30; len]);
    record
}

/// Creates an unplaced, unmapped read.
pub fn unmapped_read(name: &str, len: usize) -> RecordBuf {
    let mut record = RecordBuf::default();
    *record.name_mut() = Some(name.into());
    *record.flags_mut() = Flags::UNMAPPED;
    *record.sequence_mut() = Sequence::from(b"ACGT".iter().copied().cycle().take(len).collect::<Vec<_>>());
    *record.quality_scores_mut() = QualityScores::from(vec![30; len]);
    record
}

/// Creates `depth` reads named `<prefix>_<i>` that all start at `start`.
pub fn stacked_reads(prefix: &str, depth: usize, ref_id: usize, start: usize, len: usize) -> Vec<RecordBuf> {
    (0..depth).map(|i| mapped_read(&format!("{prefix}_{i}"), ref_id, start, len)).collect()
}

/// Writes `records` to a BAM file at `path`.
pub fn write_bam(path: &Path, header: &Header, records: &[RecordBuf]) {
    let mut writer = bam::io::Writer::new(File::create(path).expect("Failed to create BAM file"));
    writer.write_header(header).expect("Failed to write header");
    for record in records {
        writer.write_alignment_record(header, record).expect("Failed to write record");
    }
    writer.finish(header).expect("Failed to finish BAM");
}

/// Reads the header and all records from a BAM file.
pub fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let mut reader = bam::io::reader::Builder.build_from_path(path).expect("Failed to open BAM");
    let header = reader.read_header().expect("Failed to read header");
    let records =
        reader.record_bufs(&header).map(|r| r.expect("Failed to read record")).collect();
    (header, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_written_bam_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.bam");
        let mut records = stacked_reads("s", 3, 0, 100, 50);
        records.push(unmapped_read("u", 20));
        write_bam(&path, &create_coordinate_header(), &records);

        let (header, read_back) = read_bam(&path);
        assert_eq!(header.reference_sequences().len(), 2);
        assert_eq!(read_back.len(), 4);
        assert!(read_back[3].flags().is_unmapped());
    }
}
