//! Resource map parsing.
//!
//! The map region is read out of the container in one pass and parsed here
//! entirely from that buffer: map header, type list, per-type reference
//! lists, and the name list. Every offset in the map is validated against
//! the buffer before use; any out-of-range access is [`Error::Corrupt`] and
//! aborts the whole load.
//!
//! Physical sizes and compression envelopes live in the data section, not
//! the map, and are resolved afterwards by `fork.rs`.

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};
use crate::header::HEADER_LEN;
use crate::index::{ResAttrs, ResType, ResourceRef};

/// Map header: header copy (16), reserved u32 + u16 (6), attributes (2),
/// type-list offset (2), name-list offset (2).
pub const MAP_HEADER_LEN: usize = 28;
/// Type-list entry: type code (4), count minus one (2), ref-list offset (2).
pub const TYPE_ENTRY_LEN: usize = 8;
/// Reference entry: ID (2), name offset (2), attributes (1), offset high
/// byte (1), offset low word (2), reserved handle (4).
pub const REF_ENTRY_LEN: usize = 12;

/// Name-offset sentinel for an unnamed resource.
pub const NO_NAME: u16 = 0xFFFF;

pub(crate) struct ParsedMap {
    /// The map-wide attribute word.
    pub attributes: u16,
    /// Types sorted by code; refs sorted by ID. Sizes, decompressor IDs and
    /// the final compressed bit are not resolved yet.
    pub types: Vec<ResType>,
}

fn field<'a>(map: &'a [u8], offset: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
    map.get(offset..offset + len).ok_or(Error::Corrupt(what))
}

/// Parse a complete map region.
pub(crate) fn parse(map: &[u8]) -> Result<ParsedMap> {
    if map.len() < MAP_HEADER_LEN {
        return Err(Error::Corrupt("truncated resource map"));
    }

    // Skip the header copy and the two reserved fields.
    let mut cur = &map[HEADER_LEN + 6..];
    let attributes = cur.read_u16::<BigEndian>()?;
    let type_list_offset = cur.read_u16::<BigEndian>()? as usize;
    let name_list_offset = cur.read_u16::<BigEndian>()? as usize;

    let mut cur = field(map, type_list_offset, 2, "type list outside map")?;
    let count_word = cur.read_u16::<BigEndian>()?;
    // Stored count is "minus one"; 0xFFFF therefore means an empty map.
    let num_types = i32::from(count_word as i16) + 1;
    if num_types < 0 {
        return Err(Error::Corrupt("negative type count"));
    }

    let mut types = Vec::with_capacity(num_types as usize);
    for i in 0..num_types as usize {
        let entry_offset = type_list_offset + 2 + i * TYPE_ENTRY_LEN;
        let mut cur = field(map, entry_offset, TYPE_ENTRY_LEN, "type entry outside map")?;
        let code = cur.read_u32::<BigEndian>()?;
        let ref_count = cur.read_u16::<BigEndian>()? as usize + 1;
        let ref_list_offset = cur.read_u16::<BigEndian>()? as usize;

        types.push(parse_ref_list(
            map,
            code,
            ref_count,
            type_list_offset + ref_list_offset,
            name_list_offset,
        )?);
    }

    // On disk the type list is ordered alphabetically by the rendered type
    // name; lookups need numeric order.
    types.sort_by_key(|t| t.code);

    Ok(ParsedMap { attributes, types })
}

fn parse_ref_list(
    map: &[u8],
    code: u32,
    count: usize,
    list_offset: usize,
    name_list_offset: usize,
) -> Result<ResType> {
    let mut refs = Vec::with_capacity(count);
    let mut needs_sort = false;

    for j in 0..count {
        let mut cur = field(
            map,
            list_offset + j * REF_ENTRY_LEN,
            REF_ENTRY_LEN,
            "reference entry outside map",
        )?;
        let id = cur.read_i16::<BigEndian>()?;
        let name_offset = cur.read_u16::<BigEndian>()?;
        let attrs = ResAttrs::from_bits_truncate(cur.read_u8()?);
        let off_hi = cur.read_u8()?;
        let off_lo = cur.read_u16::<BigEndian>()?;
        let data_offset = (u32::from(off_hi) << 16) | u32::from(off_lo);

        if refs.last().map_or(false, |prev: &ResourceRef| id < prev.id) {
            needs_sort = true;
        }

        let name = if name_offset == NO_NAME {
            None
        } else {
            Some(read_name(map, name_list_offset + name_offset as usize)?)
        };

        refs.push(ResourceRef {
            id,
            attrs,
            size: 0,
            physical_size: 0,
            data_offset,
            decompressor: None,
            name,
        });
    }

    // Ref lists are normally ID-sorted already; re-sorting is rare. The sort
    // is stable, so duplicate IDs keep their on-disk order.
    if needs_sort {
        refs.sort_by_key(|r| r.id);
    }

    Ok(ResType { code, refs })
}

/// One length byte, then that many raw name bytes.
fn read_name(map: &[u8], offset: usize) -> Result<Vec<u8>> {
    let len = field(map, offset, 1, "name outside map")?[0] as usize;
    Ok(field(map, offset + 1, len, "name outside map")?.to_vec())
}
