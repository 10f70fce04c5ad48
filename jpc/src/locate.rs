use crate::error::{CodestreamError, Result};
use crate::index::{BlockExtent, BlockIndex};

/// Pixel rectangle covered by one block, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x0: u64,
    pub y0: u64,
    pub x1: u64,
    pub y1: u64,
}

/// Maps a pixel to the block containing it and that block's byte range.
///
/// Blocks are numbered in row-major order, the order the tile-parts were
/// found in the codestream.
pub fn locate(
    index: &BlockIndex,
    block_width: u32,
    block_height: u32,
    x: i64,
    y: i64,
) -> Result<BlockExtent> {
    let (row, column) = block_coordinate(block_width, block_height, x, y);
    let out_of_range = || CodestreamError::OutOfRange {
        x,
        y,
        row,
        column,
        rows: index.rows(),
        columns: index.columns(),
    };

    if row < 0 || column < 0 {
        return Err(out_of_range());
    }
    index
        .extent(
            u32::try_from(row).map_err(|_| out_of_range())?,
            u32::try_from(column).map_err(|_| out_of_range())?,
        )
        .ok_or_else(out_of_range)
}

// Zero sized blocks cover no pixel at all
fn block_coordinate(block_width: u32, block_height: u32, x: i64, y: i64) -> (i64, i64) {
    if block_width == 0 || block_height == 0 {
        return (-1, -1);
    }
    (
        y.div_euclid(i64::from(block_height)),
        x.div_euclid(i64::from(block_width)),
    )
}

/// The pixel rectangle of the block at `row`, `column`.
pub fn block_rect(block_width: u32, block_height: u32, row: u32, column: u32) -> BlockRect {
    let width = u64::from(block_width);
    let height = u64::from(block_height);
    let x0 = u64::from(column) * width;
    let y0 = u64::from(row) * height;
    BlockRect {
        x0,
        y0,
        x1: (x0 + width).saturating_sub(1),
        y1: (y0 + height).saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TilePartTable;

    fn index() -> BlockIndex {
        let table = TilePartTable::new(vec![10, 110, 210, 310, 410, 510], vec![100; 6]);
        BlockIndex::new(table, 2, 3).unwrap()
    }

    #[test]
    fn test_locate_row_major() {
        let index = index();
        for row in 0..2u32 {
            for column in 0..3u32 {
                let x = i64::from(column) * 64 + 63;
                let y = i64::from(row) * 32;
                let extent = locate(&index, 64, 32, x, y).unwrap();
                let i = (row * 3 + column) as usize;
                assert_eq!(extent.row, row);
                assert_eq!(extent.column, column);
                assert_eq!(extent.offset, index.offsets()[i]);
                assert_eq!(extent.length, index.sizes()[i]);
            }
        }
    }

    #[test]
    fn test_locate_out_of_range() {
        let index = index();
        assert!(matches!(
            locate(&index, 64, 32, -1, 0),
            Err(CodestreamError::OutOfRange {
                row: 0,
                column: -1,
                ..
            })
        ));
        assert!(matches!(
            locate(&index, 64, 32, 192, 0),
            Err(CodestreamError::OutOfRange { column: 3, .. })
        ));
        assert!(matches!(
            locate(&index, 64, 32, 0, 64),
            Err(CodestreamError::OutOfRange { row: 2, .. })
        ));
        assert!(matches!(
            locate(&index, 0, 32, 0, 0),
            Err(CodestreamError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_block_rect() {
        assert_eq!(
            block_rect(64, 32, 1, 2),
            BlockRect {
                x0: 128,
                y0: 32,
                x1: 191,
                y1: 63
            }
        );
    }
}
