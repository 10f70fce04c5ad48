use log::{debug, info};
use std::error;
use std::fmt;
use std::io;

type BoxType = [u8; 4];

// jP\040\040
const BOX_TYPE_SIGNATURE: BoxType = [106, 80, 32, 32];

// jp2c
const BOX_TYPE_CONTIGUOUS_CODESTREAM: BoxType = [106, 112, 50, 99];

// <CR><LF><0x87><LF>
const SIGNATURE: [u8; 4] = [13, 10, 135, 10];

#[derive(Debug)]
pub enum ContainerError {
    InvalidSignature { offset: u64 },
    BoxMalformed { box_type: BoxType, offset: u64 },
    CodestreamMissing,
    Io(io::Error),
}

impl error::Error for ContainerError {}
impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidSignature { offset } => {
                write!(f, "no JP2 signature box at offset {}", offset)
            }
            Self::BoxMalformed { box_type, offset } => {
                write!(
                    f,
                    "box {:?} malformed at offset {}",
                    String::from_utf8_lossy(box_type),
                    offset
                )
            }
            Self::CodestreamMissing => write!(f, "no contiguous codestream box"),
            Self::Io(error) => write!(f, "{}", error),
        }
    }
}

impl From<io::Error> for ContainerError {
    fn from(error: io::Error) -> ContainerError {
        ContainerError::Io(error)
    }
}

struct BoxHeader {
    offset: u64,
    box_type: BoxType,

    // LBox and TBox, plus XLBox when present
    header_length: u64,

    // Length of the box contents, None when the box runs to the end of file
    content_length: Option<u64>,
}

impl BoxHeader {
    fn content_offset(&self) -> u64 {
        self.offset + self.header_length
    }
}

// Returns None at a clean end of file between boxes
fn decode_box_header<R: io::Read>(
    reader: &mut R,
    offset: u64,
) -> Result<Option<BoxHeader>, ContainerError> {
    let mut box_length: [u8; 4] = [0; 4];
    let mut box_type: BoxType = [0; 4];

    match reader.read_exact(&mut box_length) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(error) => return Err(error.into()),
    }
    reader.read_exact(&mut box_type)?;

    let (header_length, content_length) = match u32::from_be_bytes(box_length) {
        // Last box in the file, length unknown when written
        0 => (8, None),
        1 => {
            let mut xl_length: [u8; 8] = [0; 8];
            reader.read_exact(&mut xl_length)?;
            let length = u64::from_be_bytes(xl_length)
                .checked_sub(16)
                .ok_or(ContainerError::BoxMalformed { box_type, offset })?;
            (16, Some(length))
        }
        // 2 to 7 are reserved
        2..=7 => return Err(ContainerError::BoxMalformed { box_type, offset }),
        length => (8, Some(u64::from(length) - 8)),
    };

    debug!(
        "box {:?} at offset {}, {:?} content bytes",
        String::from_utf8_lossy(&box_type),
        offset,
        content_length
    );

    Ok(Some(BoxHeader {
        offset,
        box_type,
        header_length,
        content_length,
    }))
}

/// Byte offset of the codestream inside the first contiguous codestream box.
///
/// Only the top level boxes are visited, superboxes are skipped whole.
pub fn find_codestream<R: io::Read + io::Seek>(reader: &mut R) -> Result<u64, ContainerError> {
    reader.seek(io::SeekFrom::Start(0))?;
    let signature = match decode_box_header(reader, 0)? {
        Some(header) if header.box_type == BOX_TYPE_SIGNATURE => header,
        _ => return Err(ContainerError::InvalidSignature { offset: 0 }),
    };
    let mut contents: [u8; 4] = [0; 4];
    reader.read_exact(&mut contents)?;
    if signature.content_length != Some(4) || contents != SIGNATURE {
        return Err(ContainerError::InvalidSignature { offset: 0 });
    }

    let mut offset = signature.content_offset() + 4;
    loop {
        reader.seek(io::SeekFrom::Start(offset))?;
        let header = match decode_box_header(reader, offset)? {
            Some(header) => header,
            None => break,
        };

        if header.box_type == BOX_TYPE_CONTIGUOUS_CODESTREAM {
            info!("codestream at offset {}", header.content_offset());
            return Ok(header.content_offset());
        }

        offset = match header.content_length {
            Some(length) => header.content_offset() + length,
            None => break,
        };
    }

    Err(ContainerError::CodestreamMissing)
}
