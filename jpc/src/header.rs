use log::{debug, warn};
use std::io;

use crate::error::{CodestreamError, Result};
use crate::exhaustive::seek_marker;
use crate::marker::{
    has_segment_length, read_marker, read_symbol, MarkerSymbol, MARKER_SYMBOL_COD,
    MARKER_SYMBOL_EOC, MARKER_SYMBOL_SIZ, MARKER_SYMBOL_SOC, MARKER_SYMBOL_SOT, MARKER_SYMBOL_TLM,
};
use crate::segment::{
    decode_cod, decode_siz, decode_tlm, skip_segment, CodingStyleMarkerSegment,
    ImageAndTileSizeMarkerSegment, StartOfTileSegment, TilePartLengthsSegment,
};

/// Receives what a codestream walk comes across.
///
/// Every method defaults to doing nothing, so a sink only implements what it
/// wants to see. The unit type is the sink that ignores everything.
pub trait SegmentSink {
    fn marker(&mut self, _marker: MarkerSymbol, _offset: u64) -> Result<()> {
        Ok(())
    }

    fn image_and_tile_size(&mut self, _segment: &ImageAndTileSizeMarkerSegment) -> Result<()> {
        Ok(())
    }

    fn coding_style(&mut self, _segment: &CodingStyleMarkerSegment) -> Result<()> {
        Ok(())
    }

    fn tile_part_lengths(&mut self, _segment: &TilePartLengthsSegment) -> Result<()> {
        Ok(())
    }

    fn start_of_tile(&mut self, _segment: &StartOfTileSegment) -> Result<()> {
        Ok(())
    }
}

impl SegmentSink for () {}

// A.3 - Construction of the main header
#[derive(Debug, Default)]
pub struct MainHeader {
    // SIZ (Required)
    image_and_tile_size_marker_segment: Option<ImageAndTileSizeMarkerSegment>,

    // COD (Required)
    coding_style_marker_segment: Option<CodingStyleMarkerSegment>,

    // TLM (Optional, repeatable)
    tile_part_lengths: Vec<TilePartLengthsSegment>,

    // Byte offset of the SOT closing the main header
    first_tile_part: Option<u64>,
}

impl MainHeader {
    pub fn image_and_tile_size_marker_segment(&self) -> Option<&ImageAndTileSizeMarkerSegment> {
        self.image_and_tile_size_marker_segment.as_ref()
    }

    pub fn coding_style_marker_segment(&self) -> Option<&CodingStyleMarkerSegment> {
        self.coding_style_marker_segment.as_ref()
    }

    pub fn tile_part_lengths_segments(&self) -> &[TilePartLengthsSegment] {
        &self.tile_part_lengths
    }

    pub fn first_tile_part(&self) -> Option<u64> {
        self.first_tile_part
    }
}

/// Walks the main header marker segment by marker segment.
///
/// Starts at `data_offset`, which must hold SOC, and stops on the first SOT
/// leaving the reader just after that marker. If the walk lands somewhere
/// that is not a marker the rest of the header is searched byte by byte.
pub fn read_main_header<R, S>(reader: &mut R, data_offset: u64, sink: &mut S) -> Result<MainHeader>
where
    R: io::Read + io::Seek,
    S: SegmentSink + ?Sized,
{
    let mut header = MainHeader::default();

    reader.seek(io::SeekFrom::Start(data_offset))?;
    let mut position = data_offset;
    let symbol = read_symbol(reader, &mut position)?;
    if symbol != MARKER_SYMBOL_SOC {
        return Err(CodestreamError::NotACodestream {
            offset: data_offset,
            found: Some(symbol),
        });
    }
    sink.marker(symbol, data_offset)?;

    loop {
        let offset = position;
        let marker = match read_marker(reader, &mut position) {
            Ok(Some(marker)) => marker,
            Ok(None) => {
                warn!(
                    "no marker at byte offset {} in main header, searching for SOT",
                    offset
                );
                header.first_tile_part = seek_marker(reader, &mut position, &[MARKER_SYMBOL_SOT])?
                    .map(|(_, offset)| offset);
                if let Some(offset) = header.first_tile_part {
                    sink.marker(MARKER_SYMBOL_SOT, offset)?;
                }
                break;
            }
            Err(CodestreamError::TruncatedStream { offset }) => {
                warn!("main header truncated at byte offset {}", offset);
                break;
            }
            Err(e) => return Err(e),
        };

        debug!(
            "main header marker 0x{:0>2X}{:0>2X} at byte offset {}",
            marker[0], marker[1], offset
        );
        sink.marker(marker, offset)?;

        match marker {
            MARKER_SYMBOL_SOT => {
                header.first_tile_part = Some(offset);
                break;
            }
            MARKER_SYMBOL_EOC => break,
            MARKER_SYMBOL_SIZ => {
                let segment = decode_siz(reader, offset)?;
                sink.image_and_tile_size(&segment)?;
                header.image_and_tile_size_marker_segment = Some(segment);
            }
            MARKER_SYMBOL_COD => {
                let segment = decode_cod(reader, offset)?;
                sink.coding_style(&segment)?;
                header.coding_style_marker_segment = Some(segment);
            }
            MARKER_SYMBOL_TLM => {
                let segment = decode_tlm(reader, offset)?;
                sink.tile_part_lengths(&segment)?;
                header.tile_part_lengths.push(segment);
            }
            marker if has_segment_length(marker) => skip_segment(reader, marker, offset)?,
            _ => {}
        }
        position = reader.stream_position()?;
    }

    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct Markers(Vec<(MarkerSymbol, u64)>);

    impl SegmentSink for Markers {
        fn marker(&mut self, marker: MarkerSymbol, offset: u64) -> Result<()> {
            self.0.push((marker, offset));
            Ok(())
        }
    }

    #[test]
    fn test_skips_unknown_segments_to_first_tile_part() {
        let bytes = vec![
            0xFF, 0x4F, // SOC
            0xFF, 0x64, 0x00, 0x06, 0xFF, 0x90, 0xFF, 0x90, // COM hiding an SOT
            0xFF, 0x90, 0x00, 0x0A, // SOT
        ];
        let mut reader = Cursor::new(bytes);
        let mut markers = Markers::default();
        let header = read_main_header(&mut reader, 0, &mut markers).unwrap();
        assert_eq!(header.first_tile_part(), Some(10));
        assert_eq!(
            markers.0,
            vec![
                (MARKER_SYMBOL_SOC, 0),
                ([0xFF, 0x64], 2),
                (MARKER_SYMBOL_SOT, 10)
            ]
        );
    }

    #[test]
    fn test_not_a_codestream() {
        let mut reader = Cursor::new(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        let result = read_main_header(&mut reader, 0, &mut ());
        assert!(matches!(
            result,
            Err(CodestreamError::NotACodestream {
                offset: 0,
                found: Some([0xFF, 0xD8])
            })
        ));
    }
}
