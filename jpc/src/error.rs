use std::io;

use thiserror::Error;

use crate::marker::{marker_name, MarkerSymbol};

pub type Result<T> = std::result::Result<T, CodestreamError>;

#[derive(Debug, Error)]
pub enum CodestreamError {
    // Read past the end of data in the middle of a marker or segment
    #[error("stream truncated at byte offset {offset}")]
    TruncatedStream { offset: u64 },

    #[error("not a codestream: expected SOC at byte offset {offset}, found {}", display_found(.found))]
    NotACodestream {
        offset: u64,
        found: Option<MarkerSymbol>,
    },

    // The authoritative invalidity signal for a block index
    #[error(
        "tile-part count mismatch: expected {expected} blocks, found {found_offsets} offsets and {found_sizes} sizes"
    )]
    CountMismatch {
        expected: usize,
        found_offsets: usize,
        found_sizes: usize,
    },

    #[error("declared length walk lost sync at byte offset {offset}, found {}", display_found(.found))]
    Desync {
        offset: u64,
        found: Option<MarkerSymbol>,
    },

    #[error(
        "pixel ({x}, {y}) maps to block row {row} column {column} outside of {rows}x{columns} grid"
    )]
    OutOfRange {
        x: i64,
        y: i64,
        row: i64,
        column: i64,
        rows: u32,
        columns: u32,
    },

    #[error("block index has not been built")]
    IndexNotBuilt,

    #[error("block index is invalid: {reason}")]
    IndexInvalid { reason: String },

    #[error(
        "tile-part {position} is tile {tile_index} part {part_index}, expected tile {position} part 0"
    )]
    TileOrder {
        position: usize,
        tile_index: u16,
        part_index: u8,
    },

    #[error("tile-part at byte offset {offset} declares zero length")]
    ZeroLengthTilePart { offset: u64 },

    #[error("marker {} at byte offset {offset} malformed: {reason}", display_marker(.marker))]
    MalformedSegment {
        marker: MarkerSymbol,
        offset: u64,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn display_marker(marker: &MarkerSymbol) -> String {
    format!(
        "0x{:0>2X}{:0>2X} ({})",
        marker[0],
        marker[1],
        marker_name(*marker)
    )
}

fn display_found(found: &Option<MarkerSymbol>) -> String {
    match found {
        Some(marker) => display_marker(marker),
        None => "no marker".to_string(),
    }
}

impl CodestreamError {
    /// Maps an unexpected end of file to `TruncatedStream` at `offset`.
    pub(crate) fn from_read(error: io::Error, offset: u64) -> CodestreamError {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            CodestreamError::TruncatedStream { offset }
        } else {
            CodestreamError::Io(error)
        }
    }
}
