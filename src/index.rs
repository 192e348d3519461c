//! In-memory resource index.
//!
//! Built once by the load pass and immutable afterwards: types sorted
//! ascending by numeric code, refs within a type sorted ascending by ID.
//! Both orderings back the binary searches in `fork.rs`.

use std::fmt;

bitflags::bitflags! {
    /// The 8-bit resource attribute set.
    ///
    /// After load, `COMPRESSED` reflects what the reader can act on: it is
    /// cleared whenever no valid compression envelope was found, even if the
    /// on-disk bit was set.
    pub struct ResAttrs: u8 {
        const COMPRESSED = 0x01;
        const CHANGED    = 0x02;
        const PRELOAD    = 0x04;
        const PROTECTED  = 0x08;
        const LOCKED     = 0x10;
        const PURGEABLE  = 0x20;
        const SYS_HEAP   = 0x40;
        const SYS_REF    = 0x80;
    }
}

impl Default for ResAttrs {
    fn default() -> Self {
        ResAttrs::empty()
    }
}

impl fmt::Display for ResAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ResAttrs, &str); 8] = [
            (ResAttrs::SYS_REF, "sysRef"),
            (ResAttrs::SYS_HEAP, "sysHeap"),
            (ResAttrs::PURGEABLE, "purgeable"),
            (ResAttrs::LOCKED, "locked"),
            (ResAttrs::PROTECTED, "protected"),
            (ResAttrs::PRELOAD, "preload"),
            (ResAttrs::CHANGED, "changed"),
            (ResAttrs::COMPRESSED, "compressed"),
        ];
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(bit) {
                if !first {
                    write!(f, ", ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A 4-byte resource type code, conventionally four printable characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeCode(pub u32);

impl TypeCode {
    /// Build a code from its four character bytes, e.g. `TypeCode::from_bytes(*b"ICN#")`.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        TypeCode(u32::from_be_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.to_bytes() {
            if (0x20..0x7f).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// One resource reference: identity, flags, sizes, location, optional name.
#[derive(Debug, Clone)]
pub struct ResourceRef {
    pub id: i16,
    pub attrs: ResAttrs,
    /// Logical (uncompressed) size. Equals `physical_size` unless a valid
    /// compression envelope declared otherwise.
    pub size: u32,
    /// Stored length of the raw payload on disk.
    pub physical_size: u32,
    /// Payload location relative to the data section (24-bit on disk).
    pub(crate) data_offset: u32,
    /// Decompressor ID from the envelope, present only when `attrs`
    /// still carries `COMPRESSED` after load.
    pub decompressor: Option<i16>,
    /// Resource name: raw length-prefixed bytes from the name list, legacy
    /// single-byte encoding (MacRoman), not necessarily valid UTF-8.
    pub name: Option<Vec<u8>>,
}

/// All resources of one type, ID-sorted.
#[derive(Debug, Clone)]
pub struct ResType {
    pub code: u32,
    pub(crate) refs: Vec<ResourceRef>,
}

impl ResType {
    pub fn count(&self) -> usize {
        self.refs.len()
    }

    pub fn refs(&self) -> &[ResourceRef] {
        &self.refs
    }

    /// Binary search by ID. With duplicate IDs, which duplicate is returned
    /// is unspecified.
    pub fn find(&self, id: i16) -> Option<&ResourceRef> {
        self.refs
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.refs[i])
    }

    /// Linear scan for an exact byte-for-byte name match. Unnamed resources
    /// never match.
    pub fn find_named(&self, name: &[u8]) -> Option<&ResourceRef> {
        self.refs.iter().find(|r| r.name.as_deref() == Some(name))
    }
}
