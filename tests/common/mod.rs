//! Fixture builder: assembles a resource fork image from `(type, resources)`
//! tuples, preserving the given on-disk ordering so tests can author types
//! and refs out of order.

use byteorder::{BigEndian, WriteBytesExt};

/// Attribute byte constants mirroring the on-disk bit assignments.
pub const ATTR_COMPRESSED: u8 = 0x01;
pub const ATTR_LOCKED: u8 = 0x10;

/// Where the data section starts in built fixtures.
pub const DATA_START: usize = 256;

pub struct Res {
    pub id: i16,
    pub attrs: u8,
    pub name: Option<Vec<u8>>,
    pub data: Vec<u8>,
}

impl Res {
    pub fn new(id: i16, data: &[u8]) -> Self {
        Res { id, attrs: 0, name: None, data: data.to_vec() }
    }

    pub fn named(mut self, name: &[u8]) -> Self {
        self.name = Some(name.to_vec());
        self
    }

    pub fn attrs(mut self, attrs: u8) -> Self {
        self.attrs = attrs;
        self
    }
}

/// Build a complete fork image. Types and refs are laid out in exactly the
/// order given.
pub fn build_fork(types: &[(u32, Vec<Res>)]) -> Vec<u8> {
    // Data section: length word + payload per resource, in author order.
    let mut data = Vec::new();
    let mut data_offsets: Vec<Vec<u32>> = Vec::new();
    for (_, rs) in types {
        let mut offs = Vec::new();
        for r in rs {
            offs.push(data.len() as u32);
            data.write_u32::<BigEndian>(r.data.len() as u32).unwrap();
            data.extend_from_slice(&r.data);
        }
        data_offsets.push(offs);
    }

    // Name list, with per-resource offsets (0xFFFF = unnamed).
    let mut names = Vec::new();
    let mut name_offsets: Vec<Vec<u16>> = Vec::new();
    for (_, rs) in types {
        let mut offs = Vec::new();
        for r in rs {
            match &r.name {
                None => offs.push(0xFFFF),
                Some(n) => {
                    offs.push(names.len() as u16);
                    names.push(n.len() as u8);
                    names.extend_from_slice(n);
                }
            }
        }
        name_offsets.push(offs);
    }

    // Type list directly after the 28-byte map header; ref lists directly
    // after the type list; name list last.
    const TYPE_LIST_OFFSET: usize = 28;
    let type_list_len = 2 + 8 * types.len();
    let mut ref_list_offsets = Vec::new();
    let mut next = type_list_len;
    for (_, rs) in types {
        ref_list_offsets.push(next as u16);
        next += 12 * rs.len();
    }
    let name_list_offset = TYPE_LIST_OFFSET + next;

    let mut map = Vec::new();
    map.extend_from_slice(&[0u8; 16]); // header copy, ignored by the parser
    map.extend_from_slice(&[0u8; 6]); // reserved
    map.write_u16::<BigEndian>(0).unwrap(); // map attributes
    map.write_u16::<BigEndian>(TYPE_LIST_OFFSET as u16).unwrap();
    map.write_u16::<BigEndian>(name_list_offset as u16).unwrap();

    map.write_u16::<BigEndian>((types.len() as u16).wrapping_sub(1)).unwrap();
    for (i, (code, rs)) in types.iter().enumerate() {
        map.write_u32::<BigEndian>(*code).unwrap();
        map.write_u16::<BigEndian>((rs.len() as u16).wrapping_sub(1)).unwrap();
        map.write_u16::<BigEndian>(ref_list_offsets[i]).unwrap();
    }
    for (i, (_, rs)) in types.iter().enumerate() {
        for (j, r) in rs.iter().enumerate() {
            map.write_i16::<BigEndian>(r.id).unwrap();
            map.write_u16::<BigEndian>(name_offsets[i][j]).unwrap();
            map.write_u8(r.attrs).unwrap();
            let off = data_offsets[i][j];
            map.write_u8((off >> 16) as u8).unwrap();
            map.write_u16::<BigEndian>((off & 0xFFFF) as u16).unwrap();
            map.write_u32::<BigEndian>(0).unwrap(); // reserved handle
        }
    }
    map.extend_from_slice(&names);

    let map_offset = DATA_START + data.len();
    let mut out = Vec::new();
    out.write_u32::<BigEndian>(DATA_START as u32).unwrap();
    out.write_u32::<BigEndian>(map_offset as u32).unwrap();
    out.write_u32::<BigEndian>(data.len() as u32).unwrap();
    out.write_u32::<BigEndian>(map.len() as u32).unwrap();
    out.resize(DATA_START, 0);
    out.extend_from_slice(&data);
    out.extend_from_slice(&map);
    out
}

/// Compression envelope with the `{decompressor, working, expansion}`
/// trailer, followed by `body` bytes of fake compressed payload.
pub fn envelope_v0(uncompressed_size: u32, decompressor: i16, body: &[u8]) -> Vec<u8> {
    envelope(0x0012_0901, uncompressed_size, decompressor, body)
}

/// Compression envelope with the `{working, expansion, decompressor}`
/// trailer.
pub fn envelope_v1(uncompressed_size: u32, decompressor: i16, body: &[u8]) -> Vec<u8> {
    envelope(0x0012_0801, uncompressed_size, decompressor, body)
}

/// Envelope with an arbitrary flags word and a correct tag.
pub fn envelope(flags: u32, uncompressed_size: u32, decompressor: i16, body: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.write_u32::<BigEndian>(0xA89F_6572).unwrap();
    v.write_u32::<BigEndian>(flags).unwrap();
    v.write_u32::<BigEndian>(uncompressed_size).unwrap();
    match flags {
        0x0012_0801 => {
            v.write_u8(1).unwrap(); // working buffer fraction
            v.write_u8(0).unwrap(); // expansion buffer size
            v.write_i16::<BigEndian>(decompressor).unwrap();
        }
        _ => {
            v.write_i16::<BigEndian>(decompressor).unwrap();
            v.write_u8(1).unwrap();
            v.write_u8(0).unwrap();
        }
    }
    v.extend_from_slice(body);
    v
}

/// Shorthand for a four-character type code.
pub fn code(bytes: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*bytes)
}
