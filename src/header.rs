use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Size of the fixed fork header at offset 0.
pub const HEADER_LEN: usize = 16;

/// The fixed 16-byte resource fork header. All fields big-endian.
#[derive(Debug, Clone, Copy)]
pub struct ForkHeader {
    /// Offset of the data section from the start of the fork.
    pub data_offset: u32,
    /// Offset of the resource map from the start of the fork.
    pub map_offset: u32,
    pub data_length: u32,
    pub map_length: u32,
}

impl ForkHeader {
    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            data_offset: reader.read_u32::<BigEndian>()?,
            map_offset: reader.read_u32::<BigEndian>()?,
            data_length: reader.read_u32::<BigEndian>()?,
            map_length: reader.read_u32::<BigEndian>()?,
        })
    }
}
