use log::warn;
use std::io;
use std::ops::{Deref, DerefMut};

use crate::error::{CodestreamError, Result};
use crate::marker::{read_marker, MarkerSymbol};

// Lsot, Isot, Psot, TPsot and TNsot
const START_OF_TILE_PARAMETERS: usize = 10;

/// State of a single byte-by-byte traversal.
///
/// Lives for one scan only and is handed between walker steps by value or
/// exclusive borrow, never stored alongside the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    // Absolute byte offset of the next byte to read
    position: u64,

    // Bytes consumed since the last start of tile-part, marker bytes included
    tile_part_bytes: u64,

    // Set by SOT, cleared once the SOD terminating its header is seen
    in_tile_part: bool,
}

impl ScanCursor {
    pub fn new(position: u64) -> ScanCursor {
        ScanCursor {
            position,
            tile_part_bytes: 0,
            in_tile_part: false,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn tile_part_bytes(&self) -> u64 {
        self.tile_part_bytes
    }

    pub fn in_tile_part(&self) -> bool {
        self.in_tile_part
    }

    /// Lexes the next byte or marker and counts the consumed bytes.
    pub fn next_marker<R: io::Read>(&mut self, reader: &mut R) -> Result<Option<MarkerSymbol>> {
        let start = self.position;
        let marker = read_marker(reader, &mut self.position)?;
        self.tile_part_bytes += self.position - start;
        Ok(marker)
    }

    /// Resets the counter to cover the two SOT marker bytes just read.
    pub fn start_tile_part(&mut self) {
        self.tile_part_bytes = 2;
        self.in_tile_part = true;
    }

    /// Consumes the fixed SOT parameters, Lsot through TNsot, without lexing
    /// them. The bytes still count towards the open tile-part.
    pub fn skip_start_of_tile<R: io::Read>(&mut self, reader: &mut R) -> Result<()> {
        let mut parameters: [u8; START_OF_TILE_PARAMETERS] = [0; START_OF_TILE_PARAMETERS];
        reader
            .read_exact(&mut parameters)
            .map_err(|e| CodestreamError::from_read(e, self.position))?;
        self.position += START_OF_TILE_PARAMETERS as u64;
        self.tile_part_bytes += START_OF_TILE_PARAMETERS as u64;
        Ok(())
    }

    /// Closes the open tile-part and returns its length in bytes.
    pub fn end_tile_part(&mut self) -> Option<u64> {
        if !self.in_tile_part {
            return None;
        }
        let length = self.tile_part_bytes;
        self.tile_part_bytes = 0;
        self.in_tile_part = false;
        Some(length)
    }
}

/// Puts the stream back where it was when dropped.
///
/// Every traversal entry point holds one of these for its whole body so that
/// both the `Ok` and the `Err` exits leave the caller's position untouched.
pub struct RestorePosition<'a, R: io::Seek> {
    reader: &'a mut R,
    origin: u64,
}

impl<'a, R: io::Seek> RestorePosition<'a, R> {
    pub fn new(reader: &'a mut R) -> Result<RestorePosition<'a, R>> {
        let origin = reader.stream_position()?;
        Ok(RestorePosition { reader, origin })
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }
}

impl<'a, R: io::Seek> Deref for RestorePosition<'a, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.reader
    }
}

impl<'a, R: io::Seek> DerefMut for RestorePosition<'a, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.reader
    }
}

impl<'a, R: io::Seek> Drop for RestorePosition<'a, R> {
    fn drop(&mut self) {
        if let Err(error) = self.reader.seek(io::SeekFrom::Start(self.origin)) {
            warn!(
                "unable to restore stream position {}: {}",
                self.origin, error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Seek};

    #[test]
    fn test_counts_marker_and_plain_bytes() {
        let mut reader = Cursor::new(vec![0xFF, 0x90, 0x00, 0x01, 0xFF, 0x93]);
        let mut cursor = ScanCursor::new(0);
        cursor.next_marker(&mut reader).unwrap();
        cursor.start_tile_part();
        cursor.next_marker(&mut reader).unwrap();
        cursor.next_marker(&mut reader).unwrap();
        cursor.next_marker(&mut reader).unwrap();
        assert_eq!(cursor.position(), 6);
        assert_eq!(cursor.end_tile_part(), Some(6));
        assert_eq!(cursor.end_tile_part(), None);
        assert!(!cursor.in_tile_part());
    }

    #[test]
    fn test_skip_start_of_tile_counts_parameters() {
        let mut bytes = vec![0xFF, 0x90, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x93];
        bytes.extend_from_slice(&[0x00, 0x01, 0xFF, 0x93]);
        let mut reader = Cursor::new(bytes);
        let mut cursor = ScanCursor::new(0);
        cursor.next_marker(&mut reader).unwrap();
        cursor.start_tile_part();
        cursor.skip_start_of_tile(&mut reader).unwrap();
        assert_eq!(cursor.position(), 12);
        assert_eq!(cursor.tile_part_bytes(), 12);
        assert_eq!(cursor.next_marker(&mut reader).unwrap(), Some([0xFF, 0x93]));
        assert_eq!(cursor.end_tile_part(), Some(14));

        let mut cursor = ScanCursor::new(12);
        assert!(matches!(
            cursor.skip_start_of_tile(&mut reader),
            Err(CodestreamError::TruncatedStream { offset: 12 })
        ));
    }

    #[test]
    fn test_restore_position_on_drop() {
        let mut reader = Cursor::new(vec![1, 2, 3, 4]);
        reader.seek(io::SeekFrom::Start(1)).unwrap();
        {
            let mut guard = RestorePosition::new(&mut reader).unwrap();
            assert_eq!(guard.origin(), 1);
            let mut buffer = [0; 3];
            guard.read_exact(&mut buffer).unwrap();
            assert_eq!(guard.stream_position().unwrap(), 4);
        }
        assert_eq!(reader.stream_position().unwrap(), 1);
    }
}
