use std::io;

use crate::error::{CodestreamError, Result};

pub type MarkerSymbol = [u8; 2];

// Every marker starts with this byte
pub const MARKER_LEAD: u8 = 0xFF;

// Delimiting markers and marker segments
pub const MARKER_SYMBOL_SOC: MarkerSymbol = [255, 79]; // Start of code stream
pub const MARKER_SYMBOL_SOT: MarkerSymbol = [255, 144]; // Start of tile-part
pub const MARKER_SYMBOL_SOD: MarkerSymbol = [255, 147]; // Start of data
pub const MARKER_SYMBOL_EOC: MarkerSymbol = [255, 217]; // End of codestream

// Fixed information marker segments
pub const MARKER_SYMBOL_SIZ: MarkerSymbol = [255, 81]; // Image and tile size
pub const MARKER_SYMBOL_CAP: MarkerSymbol = [255, 80]; // Extended capabilities

// Functional marker segments
pub const MARKER_SYMBOL_COD: MarkerSymbol = [255, 82]; // Coding style default
pub const MARKER_SYMBOL_COC: MarkerSymbol = [255, 83]; // Coding style component
pub const MARKER_SYMBOL_RGN: MarkerSymbol = [255, 94]; // Region-of-interest
pub const MARKER_SYMBOL_QCD: MarkerSymbol = [255, 92]; // Quantization default
pub const MARKER_SYMBOL_QCC: MarkerSymbol = [255, 93]; // Quantization component
pub const MARKER_SYMBOL_POC: MarkerSymbol = [255, 95]; // Progression order change

// Pointer marker segments
pub const MARKER_SYMBOL_TLM: MarkerSymbol = [255, 85]; // Tile-part lengths
pub const MARKER_SYMBOL_PLM: MarkerSymbol = [255, 87]; // Packet length, main header
pub const MARKER_SYMBOL_PLT: MarkerSymbol = [255, 88]; // Packet length, tile-part header
pub const MARKER_SYMBOL_PPM: MarkerSymbol = [255, 96]; // Packed packet headers, main header
pub const MARKER_SYMBOL_PPT: MarkerSymbol = [255, 97]; // Packed packet headers, tile-part header

// In bit stream markers and marker segments
pub const MARKER_SYMBOL_SOP: MarkerSymbol = [255, 145]; // Start of packet
pub const MARKER_SYMBOL_EPH: MarkerSymbol = [255, 146]; // End of packet header

// Informational marker segments
pub const MARKER_SYMBOL_CRG: MarkerSymbol = [255, 99]; // Component registration
pub const MARKER_SYMBOL_COM: MarkerSymbol = [255, 100]; // Comment

/// Groups of markers as laid out in ITU-T T.800 Table A.2.
///
/// Delimiting markers are the structural ones the block index is built from,
/// everything else only carries information about the codestream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    Delimiting,
    FixedInformation,
    Functional,
    Pointer,
    InBitStream,
    Informational,
    Unknown,
}

impl MarkerClass {
    pub fn is_structural(&self) -> bool {
        *self == MarkerClass::Delimiting
    }
}

pub fn marker_class(marker: MarkerSymbol) -> MarkerClass {
    match marker {
        MARKER_SYMBOL_SOC | MARKER_SYMBOL_SOT | MARKER_SYMBOL_SOD | MARKER_SYMBOL_EOC => {
            MarkerClass::Delimiting
        }
        MARKER_SYMBOL_SIZ | MARKER_SYMBOL_CAP => MarkerClass::FixedInformation,
        MARKER_SYMBOL_COD | MARKER_SYMBOL_COC | MARKER_SYMBOL_RGN | MARKER_SYMBOL_QCD
        | MARKER_SYMBOL_QCC | MARKER_SYMBOL_POC => MarkerClass::Functional,
        MARKER_SYMBOL_TLM | MARKER_SYMBOL_PLM | MARKER_SYMBOL_PLT | MARKER_SYMBOL_PPM
        | MARKER_SYMBOL_PPT => MarkerClass::Pointer,
        MARKER_SYMBOL_SOP | MARKER_SYMBOL_EPH => MarkerClass::InBitStream,
        MARKER_SYMBOL_CRG | MARKER_SYMBOL_COM => MarkerClass::Informational,
        _ => MarkerClass::Unknown,
    }
}

pub fn marker_name(marker: MarkerSymbol) -> &'static str {
    match marker {
        MARKER_SYMBOL_SOC => "SOC",
        MARKER_SYMBOL_SOT => "SOT",
        MARKER_SYMBOL_SOD => "SOD",
        MARKER_SYMBOL_EOC => "EOC",
        MARKER_SYMBOL_SIZ => "SIZ",
        MARKER_SYMBOL_CAP => "CAP",
        MARKER_SYMBOL_COD => "COD",
        MARKER_SYMBOL_COC => "COC",
        MARKER_SYMBOL_RGN => "RGN",
        MARKER_SYMBOL_QCD => "QCD",
        MARKER_SYMBOL_QCC => "QCC",
        MARKER_SYMBOL_POC => "POC",
        MARKER_SYMBOL_TLM => "TLM",
        MARKER_SYMBOL_PLM => "PLM",
        MARKER_SYMBOL_PLT => "PLT",
        MARKER_SYMBOL_PPM => "PPM",
        MARKER_SYMBOL_PPT => "PPT",
        MARKER_SYMBOL_SOP => "SOP",
        MARKER_SYMBOL_EPH => "EPH",
        MARKER_SYMBOL_CRG => "CRG",
        MARKER_SYMBOL_COM => "COM",
        _ => "unknown",
    }
}

/// Whether a two byte length parameter follows the marker.
///
/// Delimiting markers other than SOT, EPH and the reserved range 0xFF30 to
/// 0xFF3F stand alone.
pub fn has_segment_length(marker: MarkerSymbol) -> bool {
    !matches!(
        marker,
        MARKER_SYMBOL_SOC | MARKER_SYMBOL_SOD | MARKER_SYMBOL_EOC | MARKER_SYMBOL_EPH
    ) && !(marker[0] == MARKER_LEAD && (0x30..=0x3F).contains(&marker[1]))
}

/// Reads one byte and, if it is the lead byte, the code byte after it.
///
/// Returns `None` when the byte at the cursor is not a marker lead. `position`
/// advances by the number of bytes consumed, one or two.
pub fn read_marker<R: io::Read>(reader: &mut R, position: &mut u64) -> Result<Option<MarkerSymbol>> {
    let lead = read_byte(reader, position)?;
    if lead != MARKER_LEAD {
        return Ok(None);
    }

    let code = read_byte(reader, position)?;
    Ok(Some([lead, code]))
}

/// Reads two bytes as a marker code whatever their value.
pub fn read_symbol<R: io::Read>(reader: &mut R, position: &mut u64) -> Result<MarkerSymbol> {
    let mut symbol: MarkerSymbol = [0; 2];
    reader
        .read_exact(&mut symbol)
        .map_err(|e| CodestreamError::from_read(e, *position))?;
    *position += 2;
    Ok(symbol)
}

fn read_byte<R: io::Read>(reader: &mut R, position: &mut u64) -> Result<u8> {
    let mut byte: [u8; 1] = [0; 1];
    reader
        .read_exact(&mut byte)
        .map_err(|e| CodestreamError::from_read(e, *position))?;
    *position += 1;
    Ok(byte[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_marker_not_a_lead_byte() {
        let mut reader = Cursor::new(vec![0x12, 0xFF, 0x90]);
        let mut position = 0;
        assert_eq!(read_marker(&mut reader, &mut position).unwrap(), None);
        assert_eq!(position, 1);
        assert_eq!(
            read_marker(&mut reader, &mut position).unwrap(),
            Some(MARKER_SYMBOL_SOT)
        );
        assert_eq!(position, 3);
    }

    #[test]
    fn test_read_marker_truncated_after_lead() {
        let mut reader = Cursor::new(vec![0xFF]);
        let mut position = 0;
        let result = read_marker(&mut reader, &mut position);
        assert!(matches!(
            result,
            Err(CodestreamError::TruncatedStream { offset: 1 })
        ));
    }

    #[test]
    fn test_read_marker_end_of_stream() {
        let mut reader = Cursor::new(vec![]);
        let mut position = 7;
        let result = read_marker(&mut reader, &mut position);
        assert!(matches!(
            result,
            Err(CodestreamError::TruncatedStream { offset: 7 })
        ));
    }

    #[test]
    fn test_marker_classes() {
        assert!(marker_class(MARKER_SYMBOL_SOT).is_structural());
        assert!(marker_class(MARKER_SYMBOL_SOD).is_structural());
        assert_eq!(marker_class(MARKER_SYMBOL_COD), MarkerClass::Functional);
        assert_eq!(marker_class(MARKER_SYMBOL_TLM), MarkerClass::Pointer);
        assert_eq!(marker_class(MARKER_SYMBOL_COM), MarkerClass::Informational);
        assert_eq!(marker_class([0xFF, 0x01]), MarkerClass::Unknown);
        assert_eq!(marker_name(MARKER_SYMBOL_EOC), "EOC");
    }

    #[test]
    fn test_segment_lengths() {
        assert!(has_segment_length(MARKER_SYMBOL_SOT));
        assert!(has_segment_length(MARKER_SYMBOL_SIZ));
        assert!(!has_segment_length(MARKER_SYMBOL_SOC));
        assert!(!has_segment_length(MARKER_SYMBOL_SOD));
        assert!(!has_segment_length([0xFF, 0x35]));
    }
}
