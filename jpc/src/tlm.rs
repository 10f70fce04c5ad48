use log::info;
use std::io;

use crate::cursor::RestorePosition;
use crate::error::Result;
use crate::exhaustive::ExhaustiveScan;
use crate::header::read_main_header;
use crate::index::{TilePartScan, TilePartTable};

/// Derives tile-part offsets from the TLM marker segments of the main header.
///
/// The first tile-part starts at the SOT closing the main header and each
/// following one starts where the previous Ptlm ends. Codestreams without TLM
/// are handed to the exhaustive scan.
#[derive(Debug, Default, Clone, Copy)]
pub struct TileLengthMarkerScan;

impl TilePartScan for TileLengthMarkerScan {
    fn scan<R: io::Read + io::Seek>(
        &self,
        reader: &mut R,
        data_offset: u64,
        expected_block_count: usize,
    ) -> Result<TilePartTable> {
        let header = {
            let mut reader = RestorePosition::new(reader)?;
            read_main_header(&mut *reader, data_offset, &mut ())?
        };

        let mut segments: Vec<_> = header.tile_part_lengths_segments().iter().collect();
        if segments.is_empty() {
            info!(
                "no TLM in main header at byte offset {}, scanning every byte",
                data_offset
            );
            return ExhaustiveScan.scan(reader, data_offset, expected_block_count);
        }

        let mut offset = match header.first_tile_part() {
            Some(offset) => offset,
            None => return Ok(TilePartTable::default()),
        };

        // Ztlm orders the segments, the entries concatenate in that order
        segments.sort_by_key(|segment| segment.index());

        let mut table = TilePartTable::default();
        for entry in segments
            .iter()
            .flat_map(|segment| segment.tile_part_lengths())
        {
            table.push_offset(offset);
            table.push_size(u64::from(entry.tile_length));
            offset += u64::from(entry.tile_length);
        }
        info!(
            "TLM lists {} tile-parts from byte offset {}",
            table.offsets().len(),
            data_offset
        );

        Ok(table)
    }
}
