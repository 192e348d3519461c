//! Compression envelope detection.
//!
//! A resource whose attribute byte carries the compressed bit starts with a
//! 16-byte envelope declaring its true (uncompressed) size and the ID of an
//! external decompressor. This module only recognizes the envelope and
//! extracts those fields; no decompression ever runs here.
//!
//! The 4-byte trailer after `uncompressed_size` has two field orders, chosen
//! by the `flags` word. Each recognized flags value is decoded explicitly —
//! the layouts are never aliased over the same memory.

use byteorder::{BigEndian, ReadBytesExt};

/// Magic tag opening every compression envelope.
pub const COMPRESSED_TAG: u32 = 0xA89F_6572;

/// Flags value selecting the `{decompressor, working, expansion}` trailer.
pub const COMPRESSED_FLAGS_V0: u32 = 0x0012_0901;
/// Flags value selecting the `{working, expansion, decompressor}` trailer.
pub const COMPRESSED_FLAGS_V1: u32 = 0x0012_0801;

/// Envelope length: tag + flags + size + trailer.
pub const ENVELOPE_LEN: usize = 16;

/// Fields extracted from a recognized envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Declared size of the resource after decompression.
    pub uncompressed_size: u32,
    /// ID of the external decoder for this resource.
    pub decompressor: i16,
    pub working_buffer_fraction: u8,
    pub expansion_buffer_size: u8,
}

/// Outcome of inspecting a compressed-flagged resource's payload prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Tag mismatch: the payload is not an envelope at all.
    Absent,
    /// Tag matched but the flags value is neither recognized constant.
    /// The caller reports a diagnostic and treats the resource as
    /// uncompressed.
    UnknownFlags(u32),
    Present(Envelope),
}

/// Inspect the first [`ENVELOPE_LEN`] bytes of a resource payload.
pub fn detect(prefix: &[u8; ENVELOPE_LEN]) -> Detection {
    let mut cur = &prefix[..];
    // Reads from a fixed array cannot fail.
    let tag = cur.read_u32::<BigEndian>().unwrap_or(0);
    let flags = cur.read_u32::<BigEndian>().unwrap_or(0);
    let uncompressed_size = cur.read_u32::<BigEndian>().unwrap_or(0);

    if tag != COMPRESSED_TAG {
        return Detection::Absent;
    }

    let (decompressor, working_buffer_fraction, expansion_buffer_size) = match flags {
        COMPRESSED_FLAGS_V0 => {
            let dcmp = cur.read_i16::<BigEndian>().unwrap_or(0);
            let wrk = cur.read_u8().unwrap_or(0);
            let exp = cur.read_u8().unwrap_or(0);
            (dcmp, wrk, exp)
        }
        COMPRESSED_FLAGS_V1 => {
            let wrk = cur.read_u8().unwrap_or(0);
            let exp = cur.read_u8().unwrap_or(0);
            let dcmp = cur.read_i16::<BigEndian>().unwrap_or(0);
            (dcmp, wrk, exp)
        }
        other => return Detection::UnknownFlags(other),
    };

    Detection::Present(Envelope {
        uncompressed_size,
        decompressor,
        working_buffer_fraction,
        expansion_buffer_size,
    })
}
