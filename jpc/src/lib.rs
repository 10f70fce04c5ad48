//! Tile-part indexing for JPEG 2000 codestreams.
//!
//! Finds where each tile-part of a codestream embedded in a larger file
//! starts and how long it is, so that a single block of the image can be
//! handed to a decoder without touching the rest of the codestream.
//!
//! The codestream is a sequence of markers, two bytes each, a 0xFF lead byte
//! followed by a code. Tile-parts open with SOT and their header closes with
//! SOD. When the encoder did not write the optional TLM table, the offsets are
//! recovered by walking the marker stream:
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let mut reader = BufReader::new(File::open("image.j2k")?);
//! let index = jpc::build(&mut reader, 0, 4, 4)?;
//! let block = jpc::locate(&index, 256, 256, 300, 10)?;
//! println!("block at {} is {} bytes", block.offset, block.length);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cursor;
mod declared;
mod dump;
mod error;
mod exhaustive;
mod header;
mod index;
mod locate;
mod marker;
mod reader;
mod segment;
mod tlm;

pub use crate::cursor::{RestorePosition, ScanCursor};
pub use crate::declared::{
    walk_declared_lengths, DeclaredLengthScan, TilePartRecord, ZeroLengthPolicy,
};
pub use crate::dump::dump;
pub use crate::error::{CodestreamError, Result};
pub use crate::exhaustive::{scan_for_blocks, scan_tile_parts, verify_start, ExhaustiveScan};
pub use crate::header::{read_main_header, MainHeader, SegmentSink};
pub use crate::index::{
    build, build_with, build_with_options, verify_tile_order, BlockExtent, BlockIndex,
    CodestreamLayout, IndexOptions, ScanStrategyKind, TilePartScan, TilePartTable,
};
pub use crate::locate::{block_rect, locate, BlockRect};
pub use crate::marker::{
    has_segment_length, marker_class, marker_name, read_marker, read_symbol, MarkerClass,
    MarkerSymbol, MARKER_LEAD, MARKER_SYMBOL_CAP, MARKER_SYMBOL_COC, MARKER_SYMBOL_COD,
    MARKER_SYMBOL_COM, MARKER_SYMBOL_CRG, MARKER_SYMBOL_EOC, MARKER_SYMBOL_EPH,
    MARKER_SYMBOL_PLM, MARKER_SYMBOL_PLT, MARKER_SYMBOL_POC, MARKER_SYMBOL_PPM,
    MARKER_SYMBOL_PPT, MARKER_SYMBOL_QCC, MARKER_SYMBOL_QCD, MARKER_SYMBOL_RGN,
    MARKER_SYMBOL_SIZ, MARKER_SYMBOL_SOC, MARKER_SYMBOL_SOD, MARKER_SYMBOL_SOP,
    MARKER_SYMBOL_SOT, MARKER_SYMBOL_TLM,
};
pub use crate::reader::{BlockLayout, BlockReader};
pub use crate::segment::{
    decode_cod, decode_siz, decode_sot, decode_tlm, skip_segment, CodingStyleMarkerSegment,
    ImageAndTileSizeMarkerSegment, ProgressionOrder, StartOfTileSegment, TilePartLength,
    TilePartLengthsSegment, TransformationFilter,
};
pub use crate::tlm::TileLengthMarkerScan;
