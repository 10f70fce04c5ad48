use log::warn;
use std::io;

use crate::cursor::RestorePosition;
use crate::declared::{walk_declared_lengths, ZeroLengthPolicy};
use crate::error::{CodestreamError, Result};
use crate::exhaustive::verify_start;
use crate::header::SegmentSink;
use crate::index::BlockIndex;
use crate::marker::{marker_class, marker_name, read_marker, MarkerSymbol, MARKER_SYMBOL_EOC};
use crate::segment::{
    CodingStyleMarkerSegment, ImageAndTileSizeMarkerSegment, StartOfTileSegment,
    TilePartLengthsSegment,
};

struct TextSink<'a, W: io::Write> {
    out: &'a mut W,
}

impl<'a, W: io::Write> TextSink<'a, W> {
    fn line(&mut self, text: std::fmt::Arguments) -> Result<()> {
        self.out.write_fmt(text)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

impl<'a, W: io::Write> SegmentSink for TextSink<'a, W> {
    fn marker(&mut self, marker: MarkerSymbol, offset: u64) -> Result<()> {
        self.line(format_args!(
            "marker: 0x{:0>2x}{:0>2x} {} ({:?}) at byte offset {}",
            marker[0],
            marker[1],
            marker_name(marker),
            marker_class(marker),
            offset
        ))
    }

    fn image_and_tile_size(&mut self, segment: &ImageAndTileSizeMarkerSegment) -> Result<()> {
        self.line(format_args!("{}", segment))
    }

    fn coding_style(&mut self, segment: &CodingStyleMarkerSegment) -> Result<()> {
        self.line(format_args!("{}", segment))
    }

    fn tile_part_lengths(&mut self, segment: &TilePartLengthsSegment) -> Result<()> {
        self.line(format_args!("{}", segment))
    }

    fn start_of_tile(&mut self, segment: &StartOfTileSegment) -> Result<()> {
        self.line(format_args!("sot pos: {}", segment.offset()))?;
        self.line(format_args!("{}", segment))
    }
}

/// Writes a human readable walk of the codestream at `data_offset` to `sink`.
///
/// Prints the main header markers with SIZ, COD and TLM contents, then every
/// tile-part header found by following declared lengths up to EOC, then the
/// markers left up to EOC. Both a shortfall and a surplus of tile-parts
/// against `rows` by `columns` are reported. Malformed codestreams end the walk with a note in the
/// output rather than an error, only I/O failures are returned.
/// The stream position is restored on every exit.
pub fn dump<R, W>(
    reader: &mut R,
    data_offset: u64,
    rows: u32,
    columns: u32,
    sink: &mut W,
) -> Result<()>
where
    R: io::Read + io::Seek,
    W: io::Write,
{
    let mut reader = RestorePosition::new(reader)?;
    let mut text = TextSink { out: sink };

    text.line(format_args!("offset to codestream: {}", data_offset))?;
    if !verify_start(&mut *reader, data_offset)? {
        text.line(format_args!("no SOC at byte offset {}", data_offset))?;
        return Ok(());
    }

    let blocks = BlockIndex::block_count(rows, columns);
    let records = match walk_declared_lengths(
        &mut *reader,
        data_offset,
        usize::MAX,
        ZeroLengthPolicy::ScanForward,
        &mut text,
    ) {
        Ok(records) => records,
        Err(error @ CodestreamError::Io(_)) => return Err(error),
        Err(error) => {
            warn!("codestream walk stopped: {}", error);
            text.line(format_args!("walk stopped: {}", error))?;
            return Ok(());
        }
    };

    if records.len() != blocks {
        let mismatch = CodestreamError::CountMismatch {
            expected: blocks,
            found_offsets: records.len(),
            found_sizes: records.len(),
        };
        warn!("{}", mismatch);
        text.line(format_args!("{}", mismatch))?;
    }

    // Markers after the last tile-part, up to and including EOC
    let mut position = match records.last() {
        Some(record) => record.offset + record.length,
        None => return Ok(()),
    };
    reader.seek(io::SeekFrom::Start(position))?;
    loop {
        let offset = position;
        match read_marker(&mut *reader, &mut position) {
            Ok(Some(MARKER_SYMBOL_EOC)) => {
                text.marker(MARKER_SYMBOL_EOC, offset)?;
                text.line(format_args!("eoc pos: {}", offset))?;
                break;
            }
            Ok(Some(marker)) => text.marker(marker, offset)?,
            Ok(None) => {}
            Err(CodestreamError::TruncatedStream { .. }) => {
                text.line(format_args!("no EOC found"))?;
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
