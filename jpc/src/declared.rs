use log::{info, warn};
use std::io;

use crate::cursor::RestorePosition;
use crate::error::{CodestreamError, Result};
use crate::exhaustive::seek_marker;
use crate::header::{read_main_header, SegmentSink};
use crate::index::{TilePartScan, TilePartTable};
use crate::marker::{read_symbol, MARKER_SYMBOL_EOC, MARKER_SYMBOL_SOT};
use crate::segment::decode_sot;

/// What to do with a tile-part whose Psot is 0.
///
/// The codestream syntax reserves 0 for the last tile-part, meaning it runs
/// to EOC. An encoder writing 0 anywhere else cannot be told apart without
/// searching.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ZeroLengthPolicy {
    /// Search forward for the next SOT or EOC and end the tile-part there.
    #[default]
    ScanForward,
    /// Fail with `ZeroLengthTilePart`.
    Reject,
}

/// One tile-part as announced by its SOT marker segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePartRecord {
    // Byte offset of the SOT lead byte
    pub offset: u64,

    // Psot as written by the encoder
    pub declared_length: u32,

    // Psot, or the searched extent when Psot is 0
    pub length: u64,

    pub tile_index: u16,
    pub part_index: u8,
    pub part_count: u8,
}

/// Hops from SOT to SOT by each tile-part's declared length.
///
/// The main header is read first, handing SIZ, COD and TLM to `sink`. Stops
/// after `block_count` tile-parts, on EOC or at the end of the stream. Landing
/// on anything other than SOT or EOC fails with `Desync`. The reader is back
/// at its starting position on return.
pub fn walk_declared_lengths<R, S>(
    reader: &mut R,
    data_offset: u64,
    block_count: usize,
    zero_length: ZeroLengthPolicy,
    sink: &mut S,
) -> Result<Vec<TilePartRecord>>
where
    R: io::Read + io::Seek,
    S: SegmentSink + ?Sized,
{
    let mut reader = RestorePosition::new(reader)?;

    let header = read_main_header(&mut *reader, data_offset, sink)?;
    let mut offset = match header.first_tile_part() {
        Some(offset) => offset,
        None => {
            info!("no tile-part after main header at byte offset {}", data_offset);
            return Ok(vec![]);
        }
    };

    let mut records = Vec::with_capacity(block_count.min(4096));
    while records.len() < block_count {
        reader.seek(io::SeekFrom::Start(offset))?;
        let mut position = offset;
        let symbol = match read_symbol(&mut *reader, &mut position) {
            Ok(symbol) => symbol,
            Err(CodestreamError::TruncatedStream { .. }) => {
                info!("declared lengths walk reached end of stream at byte offset {}", offset);
                break;
            }
            Err(e) => return Err(e),
        };

        match symbol {
            MARKER_SYMBOL_SOT => {}
            MARKER_SYMBOL_EOC => break,
            _ => {
                warn!(
                    "expected SOT at byte offset {}, found 0x{:0>2X}{:0>2X}",
                    offset, symbol[0], symbol[1]
                );
                return Err(CodestreamError::Desync {
                    offset,
                    found: Some(symbol),
                });
            }
        }

        let segment = decode_sot(&mut *reader, offset)?;
        sink.start_of_tile(&segment)?;

        let length = match segment.tile_length() {
            0 => match zero_length {
                ZeroLengthPolicy::Reject => {
                    return Err(CodestreamError::ZeroLengthTilePart { offset })
                }
                ZeroLengthPolicy::ScanForward => {
                    warn!(
                        "tile-part at byte offset {} declares zero length, searching for its end",
                        offset
                    );
                    let mut position = offset + 12;
                    match seek_marker(
                        &mut *reader,
                        &mut position,
                        &[MARKER_SYMBOL_SOT, MARKER_SYMBOL_EOC],
                    )? {
                        Some((_, end)) => end - offset,
                        None => position - offset,
                    }
                }
            },
            declared => u64::from(declared),
        };

        records.push(TilePartRecord {
            offset,
            declared_length: segment.tile_length(),
            length,
            tile_index: segment.tile_index(),
            part_index: segment.tile_part_index(),
            part_count: segment.no_tile_parts(),
        });
        offset += length;
    }

    info!(
        "declared lengths walk from byte offset {} found {} tile-parts",
        data_offset,
        records.len()
    );

    Ok(records)
}

/// The fast strategy, trusts Psot.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredLengthScan {
    zero_length: ZeroLengthPolicy,
}

impl DeclaredLengthScan {
    pub fn new(zero_length: ZeroLengthPolicy) -> DeclaredLengthScan {
        DeclaredLengthScan { zero_length }
    }
}

impl TilePartScan for DeclaredLengthScan {
    fn scan<R: io::Read + io::Seek>(
        &self,
        reader: &mut R,
        data_offset: u64,
        expected_block_count: usize,
    ) -> Result<TilePartTable> {
        // Walk to EOC rather than stopping at the expected count so that
        // surplus tile-parts show up in the count check
        let records =
            walk_declared_lengths(reader, data_offset, usize::MAX, self.zero_length, &mut ())?;
        if records.len() != expected_block_count {
            warn!(
                "declared lengths walk found {} tile-parts, expected {}",
                records.len(),
                expected_block_count
            );
        }
        Ok(TilePartTable::new(
            records.iter().map(|record| record.offset).collect(),
            records.iter().map(|record| record.length).collect(),
        ))
    }
}
