use log::info;
use std::fmt;
use std::io;

use crate::error::{CodestreamError, Result};
use crate::marker::{
    MarkerSymbol, MARKER_SYMBOL_COD, MARKER_SYMBOL_SIZ, MARKER_SYMBOL_SOT, MARKER_SYMBOL_TLM,
};

// Length of marker segment in bytes (not including the marker).
fn decode_length<R: io::Read>(reader: &mut R, offset: u64) -> Result<u16> {
    let mut length: [u8; 2] = [0; 2];
    reader
        .read_exact(&mut length)
        .map_err(|e| CodestreamError::from_read(e, offset + 2))?;
    Ok(u16::from_be_bytes(length))
}

fn read_field<R: io::Read>(reader: &mut R, field: &mut [u8], offset: u64) -> Result<()> {
    reader
        .read_exact(field)
        .map_err(|e| CodestreamError::from_read(e, offset))
}

/// Skips over a marker segment using its length parameter.
///
/// `offset` is the position of the marker, the reader sits just after it.
pub fn skip_segment<R: io::Read + io::Seek>(
    reader: &mut R,
    marker: MarkerSymbol,
    offset: u64,
) -> Result<()> {
    let length = decode_length(reader, offset)?;
    if length < 2 {
        return Err(CodestreamError::MalformedSegment {
            marker,
            offset,
            reason: format!("segment length {} shorter than its own field", length),
        });
    }
    reader.seek(io::SeekFrom::Current(i64::from(length) - 2))?;
    Ok(())
}

#[derive(Debug, PartialEq)]
pub enum ProgressionOrder {
    // 0000 0000 Layer-resolution level-component-position progression
    LRLCPP,

    // 0000 0001 Resolution level-layer-component-position progression
    RLLCPP,

    // 0000 0010 Resolution level-position-component-layer progression
    RLPCLP,

    // 0000 0011 Position-component-resolution level-layer progression
    PCRLLP,

    // 0000 0100 Component-position-resolution level-layer progression
    CPRLLP,

    // All other values reserved
    Reserved { value: u8 },
}

impl ProgressionOrder {
    fn new(value: u8) -> ProgressionOrder {
        match value {
            0b0000_0000 => ProgressionOrder::LRLCPP,
            0b0000_0001 => ProgressionOrder::RLLCPP,
            0b0000_0010 => ProgressionOrder::RLPCLP,
            0b0000_0011 => ProgressionOrder::PCRLLP,
            0b0000_0100 => ProgressionOrder::CPRLLP,
            _ => ProgressionOrder::Reserved { value },
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum TransformationFilter {
    // 9-7 irreversible filter
    Irreversible,
    // 5-3 reversible filter
    Reversible,

    // All other values reserved
    Reserved { value: u8 },
}

impl TransformationFilter {
    fn new(value: u8) -> TransformationFilter {
        match value {
            0 => TransformationFilter::Irreversible,
            1 => TransformationFilter::Reversible,
            _ => TransformationFilter::Reserved { value },
        }
    }
}

// A.5.1
//
// Image and tile size (SIZ)
//
// Reference grid and tiling. The block grid of the index is the tile grid
// whenever the caller does not supply one.
#[derive(Debug, Default)]
pub struct ImageAndTileSizeMarkerSegment {
    offset: u64,
    length: u16,

    // Rsiz
    decoder_capabilities: [u8; 2],

    // Xsiz, Ysiz
    reference_grid_width: [u8; 4],
    reference_grid_height: [u8; 4],

    // XOsiz, YOsiz: image area origin on the reference grid
    image_horizontal_offset: [u8; 4],
    image_vertical_offset: [u8; 4],

    // XTsiz, YTsiz
    reference_tile_width: [u8; 4],
    reference_tile_height: [u8; 4],

    // XTOsiz, YTOsiz: first tile origin on the reference grid
    tile_horizontal_offset: [u8; 4],
    tile_vertical_offset: [u8; 4],

    // Csiz
    no_components: [u8; 2],

    // Ssiz, XRsiz, YRsiz for each component, in component order
    components: Vec<[u8; 3]>,
}

impl ImageAndTileSizeMarkerSegment {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn decoder_capabilities(&self) -> u16 {
        u16::from_be_bytes(self.decoder_capabilities)
    }

    pub fn reference_grid_width(&self) -> u32 {
        u32::from_be_bytes(self.reference_grid_width)
    }

    pub fn reference_grid_height(&self) -> u32 {
        u32::from_be_bytes(self.reference_grid_height)
    }

    pub fn image_horizontal_offset(&self) -> u32 {
        u32::from_be_bytes(self.image_horizontal_offset)
    }

    pub fn image_vertical_offset(&self) -> u32 {
        u32::from_be_bytes(self.image_vertical_offset)
    }

    pub fn reference_tile_width(&self) -> u32 {
        u32::from_be_bytes(self.reference_tile_width)
    }

    pub fn reference_tile_height(&self) -> u32 {
        u32::from_be_bytes(self.reference_tile_height)
    }

    pub fn tile_horizontal_offset(&self) -> u32 {
        u32::from_be_bytes(self.tile_horizontal_offset)
    }

    pub fn tile_vertical_offset(&self) -> u32 {
        u32::from_be_bytes(self.tile_vertical_offset)
    }

    pub fn no_components(&self) -> u16 {
        u16::from_be_bytes(self.no_components)
    }

    // ISO/IEC 15444-1:2019 Table A.11, component bit depth is value + 1.
    pub fn precision(&self, i: usize) -> Option<u8> {
        self.components.get(i).map(|c| (c[0] & 0x7f) + 1)
    }

    pub fn values_are_signed(&self, i: usize) -> Option<bool> {
        self.components.get(i).map(|c| c[0] & 0x80 == 0x80)
    }

    // The number of tiles in the X direction (numXtiles) and the Y direction
    // (numYtiles) is the following
    //
    // numXtiles = ⌈(Xsiz - XTOsiz) / XTsiz⌉
    // numYtiles = ⌈(Ysiz - YTOsiz) / YTsiz⌉
    pub fn num_x_tiles(&self) -> u32 {
        self.reference_grid_width()
            .saturating_sub(self.tile_horizontal_offset())
            .div_ceil(self.reference_tile_width())
    }

    pub fn num_y_tiles(&self) -> u32 {
        self.reference_grid_height()
            .saturating_sub(self.tile_vertical_offset())
            .div_ceil(self.reference_tile_height())
    }
}

impl fmt::Display for ImageAndTileSizeMarkerSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SIZ at byte offset {}", self.offset)?;
        writeln!(f, "  Lsiz:   {}", self.length)?;
        writeln!(f, "  Rsiz:   {}", self.decoder_capabilities())?;
        writeln!(f, "  Xsiz:   {}", self.reference_grid_width())?;
        writeln!(f, "  Ysiz:   {}", self.reference_grid_height())?;
        writeln!(f, "  XOsiz:  {}", self.image_horizontal_offset())?;
        writeln!(f, "  YOsiz:  {}", self.image_vertical_offset())?;
        writeln!(f, "  XTsiz:  {}", self.reference_tile_width())?;
        writeln!(f, "  YTsiz:  {}", self.reference_tile_height())?;
        writeln!(f, "  XTOsiz: {}", self.tile_horizontal_offset())?;
        writeln!(f, "  YTOsiz: {}", self.tile_vertical_offset())?;
        writeln!(f, "  Csiz:   {}", self.no_components())?;
        for (i, component) in self.components.iter().enumerate() {
            writeln!(
                f,
                "  component {}: Ssiz {} XRsiz {} YRsiz {}",
                i, component[0], component[1], component[2]
            )?;
        }
        write!(
            f,
            "  tiles:  {}x{}",
            self.num_x_tiles(),
            self.num_y_tiles()
        )
    }
}

pub fn decode_siz<R: io::Read>(
    reader: &mut R,
    offset: u64,
) -> Result<ImageAndTileSizeMarkerSegment> {
    info!("SIZ start at byte offset {}", offset);
    let mut segment = ImageAndTileSizeMarkerSegment {
        offset,
        length: decode_length(reader, offset)?,
        ..Default::default()
    };

    let field_offset = offset + 4;
    read_field(reader, &mut segment.decoder_capabilities, field_offset)?;
    read_field(reader, &mut segment.reference_grid_width, field_offset)?;
    read_field(reader, &mut segment.reference_grid_height, field_offset)?;
    read_field(reader, &mut segment.image_horizontal_offset, field_offset)?;
    read_field(reader, &mut segment.image_vertical_offset, field_offset)?;
    read_field(reader, &mut segment.reference_tile_width, field_offset)?;
    read_field(reader, &mut segment.reference_tile_height, field_offset)?;
    read_field(reader, &mut segment.tile_horizontal_offset, field_offset)?;
    read_field(reader, &mut segment.tile_vertical_offset, field_offset)?;
    read_field(reader, &mut segment.no_components, field_offset)?;

    // Lsiz = 38 + 3 * Csiz
    let expected_length = 38 + 3 * u32::from(segment.no_components());
    if u32::from(segment.length) != expected_length {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_SIZ,
            offset,
            reason: format!(
                "Lsiz {} does not match {} components",
                segment.length,
                segment.no_components()
            ),
        });
    }

    if segment.reference_tile_width() == 0 || segment.reference_tile_height() == 0 {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_SIZ,
            offset,
            reason: "zero tile size".to_string(),
        });
    }

    for _ in 0..segment.no_components() {
        let mut component: [u8; 3] = [0; 3];
        read_field(reader, &mut component, field_offset)?;
        segment.components.push(component);
    }
    info!("SIZ end at byte offset {}", offset + 2 + u64::from(segment.length));

    Ok(segment)
}

// A.6.1
//
// Coding style default (COD)
//
// Only read from the main header here, for the dump.
#[derive(Debug, Default)]
pub struct CodingStyleMarkerSegment {
    offset: u64,
    length: u16,

    // Scod
    coding_style: [u8; 1],

    // SGcod: progression order
    progression_order: [u8; 1],

    // SGcod: number of layers
    no_layers: [u8; 2],

    // SGcod: multiple component transformation
    multiple_component_transformation: [u8; 1],

    // SPcod: number of decomposition levels, N_L, zero implies no transformation
    no_decomposition_levels: [u8; 1],

    // SPcod: code-block width and height exponent offset values, xcb and ycb
    code_block_width: [u8; 1],
    code_block_height: [u8; 1],

    // SPcod: style of the code-block coding passes
    code_block_style: [u8; 1],

    // SPcod: wavelet transformation used
    transformation: [u8; 1],

    // Present only when Scod = xxxx xxx1, one byte per resolution level
    precinct_sizes: Vec<u8>,
}

impl CodingStyleMarkerSegment {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn coding_style(&self) -> u8 {
        self.coding_style[0]
    }

    pub fn uses_sop(&self) -> bool {
        self.coding_style[0] & 0b10 != 0
    }

    pub fn uses_eph(&self) -> bool {
        self.coding_style[0] & 0b100 != 0
    }

    pub fn progression_order(&self) -> ProgressionOrder {
        ProgressionOrder::new(self.progression_order[0])
    }

    pub fn no_layers(&self) -> u16 {
        u16::from_be_bytes(self.no_layers)
    }

    pub fn multiple_component_transformation(&self) -> u8 {
        self.multiple_component_transformation[0]
    }

    pub fn no_decomposition_levels(&self) -> u8 {
        self.no_decomposition_levels[0]
    }

    // A.18
    //
    // Code-block width and height exponent offset value xcb = value + 2 or
    // ycb = value + 2.
    pub fn code_block_width(&self) -> u16 {
        2u16.pow(u32::from((self.code_block_width[0] & 0b00001111) + 2))
    }

    pub fn code_block_height(&self) -> u16 {
        2u16.pow(u32::from((self.code_block_height[0] & 0b00001111) + 2))
    }

    pub fn code_block_style(&self) -> u8 {
        self.code_block_style[0]
    }

    pub fn transformation(&self) -> TransformationFilter {
        TransformationFilter::new(self.transformation[0])
    }

    pub fn precinct_sizes(&self) -> &[u8] {
        &self.precinct_sizes
    }
}

impl fmt::Display for CodingStyleMarkerSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "COD at byte offset {}", self.offset)?;
        writeln!(f, "  Lcod:                   {}", self.length)?;
        writeln!(f, "  Scod:                   {:#04x}", self.coding_style())?;
        writeln!(f, "  SOP:                    {}", self.uses_sop())?;
        writeln!(f, "  EPH:                    {}", self.uses_eph())?;
        writeln!(f, "  progression order:      {:?}", self.progression_order())?;
        writeln!(f, "  layers:                 {}", self.no_layers())?;
        writeln!(
            f,
            "  component transform:    {}",
            self.multiple_component_transformation()
        )?;
        writeln!(
            f,
            "  decomposition levels:   {}",
            self.no_decomposition_levels()
        )?;
        writeln!(
            f,
            "  code-block size:        {}x{}",
            self.code_block_width(),
            self.code_block_height()
        )?;
        writeln!(f, "  code-block style:       {:#04x}", self.code_block_style())?;
        write!(f, "  transformation:         {:?}", self.transformation())?;
        if !self.precinct_sizes.is_empty() {
            write!(f, "\n  precinct sizes:         {:?}", self.precinct_sizes)?;
        }
        Ok(())
    }
}

pub fn decode_cod<R: io::Read + io::Seek>(
    reader: &mut R,
    offset: u64,
) -> Result<CodingStyleMarkerSegment> {
    info!("COD start at byte offset {}", offset);
    let mut segment = CodingStyleMarkerSegment {
        offset,
        length: decode_length(reader, offset)?,
        ..Default::default()
    };

    // Lcod covers itself, Scod, SGcod and at least five bytes of SPcod
    if segment.length < 12 {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_COD,
            offset,
            reason: format!("Lcod {} too short", segment.length),
        });
    }

    let field_offset = offset + 4;
    read_field(reader, &mut segment.coding_style, field_offset)?;
    read_field(reader, &mut segment.progression_order, field_offset)?;
    read_field(reader, &mut segment.no_layers, field_offset)?;
    read_field(reader, &mut segment.multiple_component_transformation, field_offset)?;
    read_field(reader, &mut segment.no_decomposition_levels, field_offset)?;
    read_field(reader, &mut segment.code_block_width, field_offset)?;
    read_field(reader, &mut segment.code_block_height, field_offset)?;
    read_field(reader, &mut segment.code_block_style, field_offset)?;
    read_field(reader, &mut segment.transformation, field_offset)?;

    // xcb and ycb are at most 8 each and 8 together, code-blocks of 4 to 1024
    let (xcb, ycb) = (segment.code_block_width[0], segment.code_block_height[0]);
    if xcb > 8 || ycb > 8 || xcb + ycb > 8 {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_COD,
            offset,
            reason: format!("code-block exponent offsets xcb {} ycb {}", xcb, ycb),
        });
    }

    if segment.coding_style[0] & 0b1 == 1 {
        // The first parameter (8 bits) corresponds to the N_L LL sub-band.
        // Each successive parameter corresponds to each successive resolution
        // level in order.
        segment.precinct_sizes = vec![0; usize::from(segment.no_decomposition_levels()) + 1];
        read_field(reader, &mut segment.precinct_sizes, field_offset)?;
    }

    // Skip anything an extension placed after the parameters
    let consumed = 12 + segment.precinct_sizes.len() as i64;
    let remaining = i64::from(segment.length) - consumed;
    if remaining > 0 {
        reader.seek(io::SeekFrom::Current(remaining))?;
    }
    info!("COD end at byte offset {}", reader.stream_position()?);

    Ok(segment)
}

// A.4.2
//
// Start of tile-part (SOT)
//
// Parts of one tile are in TPsot order, parts of different tiles may
// interleave.
#[derive(Debug, Default, Clone)]
pub struct StartOfTileSegment {
    offset: u64,
    length: u16,

    // Isot: Tile index.
    //
    // This number refers to the tiles in raster order starting at the number 0
    tile_index: [u8; 2],

    // Psot: Length, in bytes, from the beginning of the first byte of this SOT
    // marker segment of the tile-part to the end of the data of that tile-part.
    //
    // Only the last tile-part in the codestream may contain a 0 for Psot.
    tile_length: [u8; 4],

    // TPsot: Tile-part index.
    tile_part_index: [u8; 1],

    // TNsot: Number of tile-parts of a tile in the codestream, zero when not
    // specified in this tile-part.
    no_tile_parts: [u8; 1],
}

impl StartOfTileSegment {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn tile_index(&self) -> u16 {
        u16::from_be_bytes(self.tile_index)
    }

    pub fn tile_length(&self) -> u32 {
        u32::from_be_bytes(self.tile_length)
    }

    pub fn tile_part_index(&self) -> u8 {
        self.tile_part_index[0]
    }

    pub fn no_tile_parts(&self) -> u8 {
        self.no_tile_parts[0]
    }
}

impl fmt::Display for StartOfTileSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "SOT at byte offset {}: Lsot {} Isot {} Psot {} TPsot {} TNsot {}",
            self.offset,
            self.length,
            self.tile_index(),
            self.tile_length(),
            self.tile_part_index(),
            self.no_tile_parts()
        )
    }
}

pub fn decode_sot<R: io::Read>(reader: &mut R, offset: u64) -> Result<StartOfTileSegment> {
    info!("SOT start at byte offset {}", offset);
    let mut segment = StartOfTileSegment {
        offset,
        length: decode_length(reader, offset)?,
        ..Default::default()
    };

    if segment.length != 10 {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_SOT,
            offset,
            reason: format!("Lsot {} is not 10", segment.length),
        });
    }

    let field_offset = offset + 4;
    read_field(reader, &mut segment.tile_index, field_offset)?;
    read_field(reader, &mut segment.tile_length, field_offset)?;
    read_field(reader, &mut segment.tile_part_index, field_offset)?;
    read_field(reader, &mut segment.no_tile_parts, field_offset)?;
    info!("SOT end at byte offset {}", offset + 12);

    Ok(segment)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePartLength {
    // Ttlm^i: Tile index of the ith tile-part, absent when tile-parts are in
    // tile order with one tile-part per tile.
    pub tile_index: Option<u16>,

    // Ptlm^i: Length in bytes, from the beginning of the SOT marker of the ith
    // tile-part to the end of the bit stream data for that tile-part.
    pub tile_length: u32,
}

// A.7.1
//
// Tile-part lengths (TLM)
//
// Each Ptlm repeats the Psot of the matching tile-part.
#[derive(Debug, Default)]
pub struct TilePartLengthsSegment {
    offset: u64,

    // Ltlm: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Ztlm: Index of this marker segment relative to all other TLM marker
    // segments present in the current header.
    index: [u8; 1],

    // Stlm: Size of the Ttlm and Ptlm parameters
    parameter_sizes: [u8; 1],

    tile_part_lengths: Vec<TilePartLength>,
}

impl TilePartLengthsSegment {
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    // ST: xxST xxxx, 0 none, 1 one byte, 2 two bytes
    fn tile_index_size(&self) -> Option<usize> {
        match (self.parameter_sizes[0] >> 4) & 0b11 {
            0 => Some(0),
            1 => Some(1),
            2 => Some(2),
            _ => None,
        }
    }

    // SP: xSxx xxxx, 0 two bytes, 1 four bytes
    fn tile_length_size(&self) -> usize {
        if (self.parameter_sizes[0] >> 6) & 0b1 == 1 {
            4
        } else {
            2
        }
    }

    pub fn tile_part_lengths(&self) -> &[TilePartLength] {
        &self.tile_part_lengths
    }
}

impl fmt::Display for TilePartLengthsSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "TLM at byte offset {}", self.offset)?;
        writeln!(f, "  Ltlm: {}", self.length)?;
        writeln!(f, "  Ztlm: {}", self.index())?;
        write!(f, "  Stlm: {:#04x}", self.parameter_sizes[0])?;
        for (i, entry) in self.tile_part_lengths.iter().enumerate() {
            match entry.tile_index {
                Some(tile_index) => write!(
                    f,
                    "\n  tile-part {}: Ttlm {} Ptlm {}",
                    i, tile_index, entry.tile_length
                )?,
                None => write!(f, "\n  tile-part {}: Ptlm {}", i, entry.tile_length)?,
            }
        }
        Ok(())
    }
}

pub fn decode_tlm<R: io::Read>(reader: &mut R, offset: u64) -> Result<TilePartLengthsSegment> {
    info!("TLM start at byte offset {}", offset);
    let mut segment = TilePartLengthsSegment {
        offset,
        length: decode_length(reader, offset)?,
        ..Default::default()
    };

    let field_offset = offset + 4;
    read_field(reader, &mut segment.index, field_offset)?;
    read_field(reader, &mut segment.parameter_sizes, field_offset)?;

    let tile_index_size = segment
        .tile_index_size()
        .ok_or_else(|| CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_TLM,
            offset,
            reason: format!("reserved Stlm {:#04x}", segment.parameter_sizes[0]),
        })?;
    let tile_length_size = segment.tile_length_size();
    let entry_size = tile_index_size + tile_length_size;

    // Ltlm, Ztlm and Stlm take four bytes, the rest are Ttlm/Ptlm pairs
    let payload = usize::from(segment.length).checked_sub(4).ok_or_else(|| {
        CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_TLM,
            offset,
            reason: format!("Ltlm {} too short", segment.length),
        }
    })?;
    if payload % entry_size != 0 {
        return Err(CodestreamError::MalformedSegment {
            marker: MARKER_SYMBOL_TLM,
            offset,
            reason: format!(
                "Ltlm {} is not a whole number of {} byte entries",
                segment.length, entry_size
            ),
        });
    }

    let mut entry: [u8; 6] = [0; 6];
    for _ in 0..payload / entry_size {
        let entry = &mut entry[..entry_size];
        read_field(reader, entry, field_offset)?;
        let (tile_index, tile_length) = entry.split_at(tile_index_size);

        segment.tile_part_lengths.push(TilePartLength {
            tile_index: match tile_index {
                [] => None,
                [index] => Some(u16::from(*index)),
                [high, low] => Some(u16::from_be_bytes([*high, *low])),
                _ => unreachable!(),
            },
            tile_length: match tile_length {
                [high, low] => u32::from(u16::from_be_bytes([*high, *low])),
                [a, b, c, d] => u32::from_be_bytes([*a, *b, *c, *d]),
                _ => unreachable!(),
            },
        });
    }
    info!("TLM end at byte offset {}", offset + 2 + u64::from(segment.length));

    Ok(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_sot() {
        let mut reader = Cursor::new(vec![0x00, 0x0A, 0x00, 0x03, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01]);
        let sot = decode_sot(&mut reader, 40).unwrap();
        assert_eq!(sot.offset(), 40);
        assert_eq!(sot.tile_index(), 3);
        assert_eq!(sot.tile_length(), 256);
        assert_eq!(sot.tile_part_index(), 0);
        assert_eq!(sot.no_tile_parts(), 1);
    }

    #[test]
    fn test_decode_sot_bad_length() {
        let mut reader = Cursor::new(vec![0x00, 0x0B, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let result = decode_sot(&mut reader, 0);
        assert!(matches!(
            result,
            Err(CodestreamError::MalformedSegment { offset: 0, .. })
        ));
    }

    #[test]
    fn test_decode_cod_code_block_size() {
        // Lcod, Scod, LRCP, one layer, no MCT, five levels, xcb, ycb, style, 5-3
        let cod = |xcb: u8, ycb: u8| {
            vec![0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, xcb, ycb, 0x00, 0x01]
        };

        let segment = decode_cod(&mut Cursor::new(cod(8, 0)), 45).unwrap();
        assert_eq!(segment.code_block_width(), 1024);
        assert_eq!(segment.code_block_height(), 4);

        for (xcb, ycb) in [(0x0F, 0), (0, 0x0E), (9, 0), (5, 4)] {
            assert!(matches!(
                decode_cod(&mut Cursor::new(cod(xcb, ycb)), 45),
                Err(CodestreamError::MalformedSegment { offset: 45, .. })
            ));
        }
    }

    #[test]
    fn test_decode_tlm_16_bit_index_32_bit_length() {
        // Ltlm = 4 + 2 * 6, Stlm = 0b0110_0000
        let mut reader = Cursor::new(vec![
            0x00, 0x10, 0x00, 0x60, //
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, //
            0x00, 0x01, 0x00, 0x00, 0x02, 0x00,
        ]);
        let tlm = decode_tlm(&mut reader, 0).unwrap();
        assert_eq!(
            tlm.tile_part_lengths(),
            &[
                TilePartLength {
                    tile_index: Some(0),
                    tile_length: 256
                },
                TilePartLength {
                    tile_index: Some(1),
                    tile_length: 512
                },
            ]
        );
    }

    #[test]
    fn test_decode_tlm_no_index_16_bit_length() {
        let mut reader = Cursor::new(vec![0x00, 0x08, 0x00, 0x00, 0x00, 0x64, 0x00, 0xC8]);
        let tlm = decode_tlm(&mut reader, 0).unwrap();
        let lengths: Vec<u32> = tlm
            .tile_part_lengths()
            .iter()
            .map(|entry| entry.tile_length)
            .collect();
        assert_eq!(lengths, vec![100, 200]);
        assert!(tlm.tile_part_lengths()[0].tile_index.is_none());
    }

    #[test]
    fn test_siz_tile_grid() {
        let mut bytes = vec![0x00, 0x29, 0x00, 0x00];
        bytes.extend_from_slice(&300u32.to_be_bytes()); // Xsiz
        bytes.extend_from_slice(&200u32.to_be_bytes()); // Ysiz
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&128u32.to_be_bytes()); // XTsiz
        bytes.extend_from_slice(&128u32.to_be_bytes()); // YTsiz
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x01, 0x07, 0x01, 0x01]);
        let mut reader = Cursor::new(bytes);
        let siz = decode_siz(&mut reader, 2).unwrap();
        assert_eq!(siz.num_x_tiles(), 3);
        assert_eq!(siz.num_y_tiles(), 2);
        assert_eq!(siz.precision(0), Some(8));
        assert_eq!(siz.values_are_signed(0), Some(false));
    }
}
