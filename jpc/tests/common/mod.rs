#![allow(dead_code)]

use std::io::Cursor;

pub struct TilePart {
    pub tile_index: u16,
    pub part_index: u8,

    // Total bytes of a COM segment placed in the tile-part header, 0 for none
    pub header_padding: usize,

    pub data: Vec<u8>,

    // Psot to write instead of the real length
    pub declared_length: Option<u32>,
}

impl TilePart {
    pub fn new(tile_index: u16, data: Vec<u8>) -> TilePart {
        TilePart {
            tile_index,
            part_index: 0,
            header_padding: 0,
            data,
            declared_length: None,
        }
    }

    pub fn padded(tile_index: u16, header_padding: usize) -> TilePart {
        TilePart {
            header_padding,
            ..TilePart::new(tile_index, vec![])
        }
    }

    // SOT segment, optional COM, SOD
    fn header_length(&self) -> usize {
        12 + self.header_padding + 2
    }

    fn length(&self) -> usize {
        self.header_length() + self.data.len()
    }
}

/// Entropy coded looking bytes, with 0xFF only ever followed by a low byte.
pub fn data(length: usize) -> Vec<u8> {
    let mut data: Vec<u8> = (0..length)
        .map(|i| match i % 7 {
            3 => 0xFF,
            4 => 0x00,
            _ => (i % 0x80) as u8,
        })
        .collect();
    // A trailing lead byte would swallow the next marker's lead byte
    if data.last() == Some(&0xFF) {
        data.pop();
        data.push(0x01);
    }
    data
}

pub struct Codestream {
    pub prefix: usize,
    pub rows: u32,
    pub columns: u32,
    pub tile_size: u32,
    pub tile_parts: Vec<TilePart>,
    pub tlm: bool,
    pub eoc: bool,
}

pub struct Built {
    pub bytes: Vec<u8>,
    pub data_offset: u64,

    // Byte offset of each SOT lead byte
    pub offsets: Vec<u64>,

    // Bytes from each SOT through the end of its SOD
    pub header_sizes: Vec<u64>,

    // Real length of each tile-part
    pub lengths: Vec<u64>,
}

impl Built {
    pub fn reader(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes.clone())
    }

    pub fn truncated(&self, length: usize) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes[..length].to_vec())
    }
}

impl Codestream {
    /// One tile-part per block in raster order with `data_length` bytes each.
    pub fn grid(rows: u32, columns: u32, data_length: usize) -> Codestream {
        let tile_parts = (0..rows * columns)
            .map(|i| TilePart::new(i as u16, data(data_length + i as usize)))
            .collect();
        Codestream {
            prefix: 0,
            rows,
            columns,
            tile_size: 64,
            tile_parts,
            tlm: false,
            eoc: true,
        }
    }

    pub fn with_prefix(mut self, prefix: usize) -> Codestream {
        self.prefix = prefix;
        self
    }

    pub fn with_tlm(mut self) -> Codestream {
        self.tlm = true;
        self
    }

    pub fn build(&self) -> Built {
        let mut bytes = vec![b'N'; self.prefix];

        // SOC
        bytes.extend_from_slice(&[0xFF, 0x4F]);

        // SIZ with one 8 bit component
        bytes.extend_from_slice(&[0xFF, 0x51, 0x00, 0x29, 0x00, 0x00]);
        bytes.extend_from_slice(&(self.columns * self.tile_size).to_be_bytes());
        bytes.extend_from_slice(&(self.rows * self.tile_size).to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&self.tile_size.to_be_bytes());
        bytes.extend_from_slice(&self.tile_size.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x01, 0x07, 0x01, 0x01]);

        // COD, LRCP, one layer, five levels, 64x64 code-blocks, 5-3 filter
        bytes.extend_from_slice(&[
            0xFF, 0x52, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x01, 0x00, 0x05, 0x04, 0x04, 0x00, 0x01,
        ]);

        // QCD, no quantization, single exponent
        bytes.extend_from_slice(&[0xFF, 0x5C, 0x00, 0x04, 0x40, 0x48]);

        if self.tlm {
            let length = 4 + 6 * self.tile_parts.len() as u16;
            bytes.extend_from_slice(&[0xFF, 0x55]);
            bytes.extend_from_slice(&length.to_be_bytes());
            bytes.extend_from_slice(&[0x00, 0x60]);
            for tile_part in &self.tile_parts {
                bytes.extend_from_slice(&tile_part.tile_index.to_be_bytes());
                bytes.extend_from_slice(&(tile_part.length() as u32).to_be_bytes());
            }
        }

        let mut offsets = vec![];
        let mut header_sizes = vec![];
        let mut lengths = vec![];
        for tile_part in &self.tile_parts {
            offsets.push(bytes.len() as u64);
            header_sizes.push(tile_part.header_length() as u64);
            lengths.push(tile_part.length() as u64);

            let declared = tile_part
                .declared_length
                .unwrap_or(tile_part.length() as u32);
            bytes.extend_from_slice(&[0xFF, 0x90, 0x00, 0x0A]);
            bytes.extend_from_slice(&tile_part.tile_index.to_be_bytes());
            bytes.extend_from_slice(&declared.to_be_bytes());
            bytes.extend_from_slice(&[tile_part.part_index, 0x01]);

            if tile_part.header_padding > 0 {
                // COM with Latin text, the marker itself is not counted in Lcom
                let length = (tile_part.header_padding - 2) as u16;
                bytes.extend_from_slice(&[0xFF, 0x64]);
                bytes.extend_from_slice(&length.to_be_bytes());
                bytes.extend_from_slice(&[0x00, 0x01]);
                bytes.extend(std::iter::repeat(b'x').take(tile_part.header_padding - 6));
            }

            bytes.extend_from_slice(&[0xFF, 0x93]);
            bytes.extend_from_slice(&tile_part.data);
        }

        if self.eoc {
            bytes.extend_from_slice(&[0xFF, 0xD9]);
        }

        Built {
            bytes,
            data_offset: self.prefix as u64,
            offsets,
            header_sizes,
            lengths,
        }
    }
}
