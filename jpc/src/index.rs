use log::{info, warn};
use std::io;

use crate::cursor::RestorePosition;
use crate::declared::{DeclaredLengthScan, ZeroLengthPolicy};
use crate::error::{CodestreamError, Result};
use crate::exhaustive::ExhaustiveScan;
use crate::marker::{read_symbol, MARKER_SYMBOL_SOT};
use crate::segment::decode_sot;
use crate::tlm::TileLengthMarkerScan;

/// Where the codestream sits in its container and how it is blocked, as
/// told by the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodestreamLayout {
    pub data_offset: u64,
    pub rows: u32,
    pub columns: u32,
}

impl CodestreamLayout {
    pub fn block_count(&self) -> usize {
        BlockIndex::block_count(self.rows, self.columns)
    }
}

/// Offsets and sizes of tile-parts as discovered, before any check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TilePartTable {
    offsets: Vec<u64>,
    sizes: Vec<u64>,
}

impl TilePartTable {
    pub fn new(offsets: Vec<u64>, sizes: Vec<u64>) -> TilePartTable {
        TilePartTable { offsets, sizes }
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub(crate) fn push_offset(&mut self, offset: u64) {
        self.offsets.push(offset);
    }

    pub(crate) fn push_size(&mut self, size: u64) {
        self.sizes.push(size);
    }

    /// Both tables must hold exactly one entry per block.
    pub fn check_count(&self, expected: usize) -> Result<()> {
        if self.offsets.len() != expected || self.sizes.len() != expected {
            warn!(
                "block count {} does not match {} offsets and {} sizes",
                expected,
                self.offsets.len(),
                self.sizes.len()
            );
            return Err(CodestreamError::CountMismatch {
                expected,
                found_offsets: self.offsets.len(),
                found_sizes: self.sizes.len(),
            });
        }
        Ok(())
    }
}

/// Byte range of one block inside the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockExtent {
    pub row: u32,
    pub column: u32,
    pub offset: u64,
    pub length: u64,
}

/// Tile-part offsets and sizes for a block grid, one entry per block in
/// row-major order.
///
/// Only ever constructed with as many entries as the grid has blocks and
/// never changed afterwards, so it can be shared freely between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndex {
    rows: u32,
    columns: u32,
    offsets: Vec<u64>,
    sizes: Vec<u64>,
}

impl BlockIndex {
    pub fn block_count(rows: u32, columns: u32) -> usize {
        rows as usize * columns as usize
    }

    pub fn new(table: TilePartTable, rows: u32, columns: u32) -> Result<BlockIndex> {
        table.check_count(BlockIndex::block_count(rows, columns))?;
        Ok(BlockIndex {
            rows,
            columns,
            offsets: table.offsets,
            sizes: table.sizes,
        })
    }

    /// Index for blocks known to share one byte size, laid out back to back
    /// from `data_offset`.
    pub fn uniform(data_offset: u64, size: u64, rows: u32, columns: u32) -> BlockIndex {
        let count = BlockIndex::block_count(rows, columns);
        BlockIndex {
            rows,
            columns,
            offsets: (0..count as u64).map(|i| data_offset + i * size).collect(),
            sizes: vec![size; count],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn extent(&self, row: u32, column: u32) -> Option<BlockExtent> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let i = row as usize * self.columns as usize + column as usize;
        Some(BlockExtent {
            row,
            column,
            offset: self.offsets[i],
            length: self.sizes[i],
        })
    }

    /// The byte size shared by every block, if there is one.
    pub fn uniform_size(&self) -> Option<u64> {
        let (first, rest) = self.sizes.split_first()?;
        if rest.iter().all(|size| size == first) {
            Some(*first)
        } else {
            None
        }
    }
}

/// A way of locating the tile-parts of a codestream.
pub trait TilePartScan {
    fn scan<R: io::Read + io::Seek>(
        &self,
        reader: &mut R,
        data_offset: u64,
        expected_block_count: usize,
    ) -> Result<TilePartTable>;
}

/// Which scanning strategy `build_with_options` runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategyKind {
    /// Byte by byte, for encoders whose declared lengths are not trusted.
    #[default]
    Exhaustive,
    /// Jump between SOT markers using Psot.
    DeclaredLengths,
    /// Read tile-part lengths from TLM marker segments in the main header.
    TileLengthMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    pub strategy: ScanStrategyKind,

    // Require tile-part i to be tile i part 0
    pub verify_tile_order: bool,

    pub zero_length: ZeroLengthPolicy,
}

impl Default for IndexOptions {
    fn default() -> IndexOptions {
        IndexOptions {
            strategy: ScanStrategyKind::Exhaustive,
            verify_tile_order: true,
            zero_length: ZeroLengthPolicy::ScanForward,
        }
    }
}

/// Builds the block index with the exhaustive scan and default checks.
///
/// The stream position is the same after the call as before it, whatever
/// the outcome.
pub fn build<R: io::Read + io::Seek>(
    reader: &mut R,
    data_offset: u64,
    rows: u32,
    columns: u32,
) -> Result<BlockIndex> {
    let layout = CodestreamLayout {
        data_offset,
        rows,
        columns,
    };
    build_with_options(reader, &layout, &IndexOptions::default())
}

pub fn build_with_options<R: io::Read + io::Seek>(
    reader: &mut R,
    layout: &CodestreamLayout,
    options: &IndexOptions,
) -> Result<BlockIndex> {
    match options.strategy {
        ScanStrategyKind::Exhaustive => build_with(&ExhaustiveScan, reader, layout, options),
        ScanStrategyKind::DeclaredLengths => build_with(
            &DeclaredLengthScan::new(options.zero_length),
            reader,
            layout,
            options,
        ),
        ScanStrategyKind::TileLengthMarkers => {
            build_with(&TileLengthMarkerScan, reader, layout, options)
        }
    }
}

pub fn build_with<S, R>(
    strategy: &S,
    reader: &mut R,
    layout: &CodestreamLayout,
    options: &IndexOptions,
) -> Result<BlockIndex>
where
    S: TilePartScan,
    R: io::Read + io::Seek,
{
    let mut reader = RestorePosition::new(reader)?;
    info!(
        "building {}x{} block index from byte offset {} with {:?}",
        layout.rows, layout.columns, layout.data_offset, options.strategy
    );

    let table = strategy.scan(&mut *reader, layout.data_offset, layout.block_count())?;
    let index = BlockIndex::new(table, layout.rows, layout.columns)?;
    if options.verify_tile_order {
        verify_tile_order(&mut *reader, &index)?;
    }

    Ok(index)
}

/// Checks that the tile-part at position i of the index belongs to tile i.
///
/// Tile-parts of the codestream need only appear in order per tile, the
/// block index additionally assumes raster order with one part per tile.
pub fn verify_tile_order<R: io::Read + io::Seek>(reader: &mut R, index: &BlockIndex) -> Result<()> {
    for (position, &offset) in index.offsets().iter().enumerate() {
        reader.seek(io::SeekFrom::Start(offset))?;
        let mut cursor = offset;
        let symbol = read_symbol(reader, &mut cursor)?;
        if symbol != MARKER_SYMBOL_SOT {
            return Err(CodestreamError::Desync {
                offset,
                found: Some(symbol),
            });
        }

        let segment = decode_sot(reader, offset)?;
        if usize::from(segment.tile_index()) != position || segment.tile_part_index() != 0 {
            warn!(
                "tile-part {} at byte offset {} is tile {} part {}",
                position,
                offset,
                segment.tile_index(),
                segment.tile_part_index()
            );
            return Err(CodestreamError::TileOrder {
                position,
                tile_index: segment.tile_index(),
                part_index: segment.tile_part_index(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_mismatch() {
        let table = TilePartTable::new(vec![10, 20, 30], vec![5, 5]);
        let result = BlockIndex::new(table, 1, 3);
        assert!(matches!(
            result,
            Err(CodestreamError::CountMismatch {
                expected: 3,
                found_offsets: 3,
                found_sizes: 2
            })
        ));
    }

    #[test]
    fn test_empty_grid_accepts_empty_table() {
        let index = BlockIndex::new(TilePartTable::default(), 0, 4).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.uniform_size(), None);
    }

    #[test]
    fn test_uniform_index() {
        let index = BlockIndex::uniform(100, 50, 2, 2);
        assert_eq!(index.offsets(), &[100, 150, 200, 250]);
        assert_eq!(index.uniform_size(), Some(50));
        assert_eq!(
            index.extent(1, 0),
            Some(BlockExtent {
                row: 1,
                column: 0,
                offset: 200,
                length: 50
            })
        );
        assert_eq!(index.extent(2, 0), None);
    }

    #[test]
    fn test_mixed_sizes_are_not_uniform() {
        let table = TilePartTable::new(vec![0, 10], vec![10, 12]);
        let index = BlockIndex::new(table, 1, 2).unwrap();
        assert_eq!(index.uniform_size(), None);
    }

    #[test]
    fn test_index_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlockIndex>();
    }
}
