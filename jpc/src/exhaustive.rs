use log::{debug, info};
use std::io;

use crate::cursor::{RestorePosition, ScanCursor};
use crate::error::{CodestreamError, Result};
use crate::index::{BlockIndex, TilePartScan, TilePartTable};
use crate::marker::{
    read_marker, read_symbol, MarkerSymbol, MARKER_SYMBOL_SOC, MARKER_SYMBOL_SOD,
    MARKER_SYMBOL_SOT,
};

/// Seeks to `data_offset` and checks for the start of codestream marker.
///
/// A stream too short to hold a marker is not a codestream either. The
/// reader is left wherever the check stopped.
pub fn verify_start<R: io::Read + io::Seek>(reader: &mut R, data_offset: u64) -> Result<bool> {
    Ok(read_start_marker(reader, data_offset)? == Some(MARKER_SYMBOL_SOC))
}

fn read_start_marker<R: io::Read + io::Seek>(
    reader: &mut R,
    data_offset: u64,
) -> Result<Option<MarkerSymbol>> {
    reader.seek(io::SeekFrom::Start(data_offset))?;
    let mut position = data_offset;
    match read_symbol(reader, &mut position) {
        Ok(symbol) => Ok(Some(symbol)),
        Err(CodestreamError::TruncatedStream { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Walks every byte after SOC collecting tile-part starts and ends.
///
/// Each SOT adds the offset of its lead byte. The fixed SOT parameters that
/// follow are counted but not lexed. Each SOD following an SOT adds
/// the number of bytes from that SOT's lead byte through the SOD marker
/// itself. A stream ending in the middle of a marker is not an error, the
/// tables simply hold what was found up to that point. The tables are not
/// checked against any grid here.
pub fn scan_tile_parts<R: io::Read + io::Seek>(
    reader: &mut R,
    data_offset: u64,
) -> Result<TilePartTable> {
    let mut reader = RestorePosition::new(reader)?;

    let found = read_start_marker(&mut *reader, data_offset)?;
    if found != Some(MARKER_SYMBOL_SOC) {
        return Err(CodestreamError::NotACodestream {
            offset: data_offset,
            found,
        });
    }

    let mut table = TilePartTable::default();
    let mut cursor = ScanCursor::new(data_offset + 2);
    loop {
        let start = cursor.position();
        match cursor.next_marker(&mut *reader) {
            Ok(Some(MARKER_SYMBOL_SOT)) => {
                debug!("SOT at byte offset {}", start);
                table.push_offset(start);
                cursor.start_tile_part();
                // Isot and Psot may hold bytes that lex as markers
                match cursor.skip_start_of_tile(&mut *reader) {
                    Ok(()) => {}
                    Err(CodestreamError::TruncatedStream { offset }) => {
                        debug!("scan reached end of stream at byte offset {}", offset);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(Some(MARKER_SYMBOL_SOD)) => {
                if let Some(size) = cursor.end_tile_part() {
                    debug!("SOD at byte offset {}, tile-part size {}", start, size);
                    table.push_size(size);
                }
            }
            Ok(_) => {}
            Err(CodestreamError::TruncatedStream { offset }) => {
                debug!("scan reached end of stream at byte offset {}", offset);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "scan from byte offset {} found {} tile-part offsets and {} sizes",
        data_offset,
        table.offsets().len(),
        table.sizes().len()
    );

    Ok(table)
}

/// Scans the codestream and checks the tables against `expected_block_count`.
pub fn scan_for_blocks<R: io::Read + io::Seek>(
    reader: &mut R,
    data_offset: u64,
    expected_block_count: usize,
) -> Result<TilePartTable> {
    let table = scan_tile_parts(reader, data_offset)?;
    table.check_count(expected_block_count)?;
    Ok(table)
}

/// Searches forward byte by byte for the first of `targets`.
///
/// Returns the marker found and the offset of its lead byte, or `None` when
/// the stream ends first. `position` must track the reader.
pub(crate) fn seek_marker<R: io::Read>(
    reader: &mut R,
    position: &mut u64,
    targets: &[MarkerSymbol],
) -> Result<Option<(MarkerSymbol, u64)>> {
    loop {
        let offset = *position;
        match read_marker(reader, position) {
            Ok(Some(marker)) if targets.contains(&marker) => return Ok(Some((marker, offset))),
            Ok(_) => {}
            Err(CodestreamError::TruncatedStream { .. }) => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}

/// The robust strategy, trusts nothing but the markers themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExhaustiveScan;

impl TilePartScan for ExhaustiveScan {
    fn scan<R: io::Read + io::Seek>(
        &self,
        reader: &mut R,
        data_offset: u64,
        _expected_block_count: usize,
    ) -> Result<TilePartTable> {
        scan_tile_parts(reader, data_offset)
    }
}

impl ExhaustiveScan {
    /// Builds a validated index for a `rows` by `columns` block grid.
    pub fn index<R: io::Read + io::Seek>(
        &self,
        reader: &mut R,
        data_offset: u64,
        rows: u32,
        columns: u32,
    ) -> Result<BlockIndex> {
        let table = self.scan(reader, data_offset, BlockIndex::block_count(rows, columns))?;
        BlockIndex::new(table, rows, columns)
    }
}
