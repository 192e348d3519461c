//! The [`ResourceFork`] container — load pass, lookups, and the read path.
//!
//! ```no_run
//! use resfork::{ResourceFork, TypeCode};
//!
//! let fork = ResourceFork::open_path("Sound.rsrc")?;
//! let icon = TypeCode::from_bytes(*b"ICN#").0;
//! for attr in fork.list(icon, 0, 0)?.0 {
//!     println!("{} {}", attr.id, attr.size);
//! }
//! let bytes = fork.read(icon, -16455, 0, 0)?;
//! # Ok::<(), resfork::Error>(())
//! ```
//!
//! Loading is a single blocking pass: header, map region, then one physical
//! size read per resource plus an envelope probe for compressed-flagged ones.
//! Any structural failure aborts the whole load with one error; a container
//! is never returned half-built. After load the index is immutable and every
//! operation takes `&self`, so independent lookups and reads are data-race
//! free (the byte source serializes its own cursor if it has one).

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use crate::compress::{self, Detection, ENVELOPE_LEN};
use crate::error::{Error, Result};
use crate::header::{ForkHeader, HEADER_LEN};
use crate::index::{ResAttrs, ResType, ResourceRef, TypeCode};
use crate::map;
use crate::source::{ByteSource, MemSource, StreamSource};

/// Borrowed attribute view of one resource, the unit of directory listings.
/// The name bytes live in the container and stay valid for its lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResAttr<'f> {
    pub id: i16,
    pub attrs: ResAttrs,
    /// Logical size (see [`ResourceRef::size`]).
    pub size: u32,
    pub name: Option<&'f [u8]>,
}

impl<'f> ResAttr<'f> {
    fn new(r: &'f ResourceRef) -> Self {
        ResAttr {
            id: r.id,
            attrs: r.attrs,
            size: r.size,
            name: r.name.as_deref(),
        }
    }
}

/// A loaded, read-only resource fork.
pub struct ResourceFork<S: ByteSource> {
    source: S,
    data_offset: u64,
    attributes: u16,
    types: Vec<ResType>,
}

// ── Constructors ─────────────────────────────────────────────────────────────

impl ResourceFork<StreamSource<File>> {
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_source(StreamSource::open(path)?)
    }
}

impl<'a> ResourceFork<MemSource<'a>> {
    /// Parse a caller-owned buffer without copying it.
    pub fn open_bytes(buf: &'a [u8]) -> Result<Self> {
        Self::open_source(MemSource::borrowed(buf))
    }
}

impl ResourceFork<MemSource<'static>> {
    /// Take ownership of `buf` for the life of the container.
    pub fn open_vec(buf: Vec<u8>) -> Result<Self> {
        Self::open_source(MemSource::owned(buf))
    }
}

impl<R: Read + Seek> ResourceFork<StreamSource<R>> {
    /// Parse through any seekable reader, e.g. a fork embedded in a larger
    /// file. The reader's cursor is serialized internally.
    pub fn open_reader(reader: R) -> Result<Self> {
        Self::open_source(StreamSource::new(reader)?)
    }
}

impl<S: ByteSource> ResourceFork<S> {
    /// Parse through any [`ByteSource`] implementation.
    pub fn open_source(source: S) -> Result<Self> {
        let mut header_buf = [0u8; HEADER_LEN];
        read_structural(&source, 0, &mut header_buf, "truncated header")?;
        let header = ForkHeader::read(&header_buf[..])?;

        let mut map_buf = vec![0u8; header.map_length as usize];
        read_structural(
            &source,
            u64::from(header.map_offset),
            &mut map_buf,
            "map outside container",
        )?;
        let parsed = map::parse(&map_buf)?;

        let mut fork = ResourceFork {
            source,
            data_offset: u64::from(header.data_offset),
            attributes: parsed.attributes,
            types: parsed.types,
        };
        fork.resolve_sizes()?;
        Ok(fork)
    }

    /// Fill in physical sizes from the data section, then resolve logical
    /// sizes and decompressor IDs for compressed-flagged resources.
    fn resolve_sizes(&mut self) -> Result<()> {
        for ti in 0..self.types.len() {
            for ri in 0..self.types[ti].refs.len() {
                let abs = self.data_offset + u64::from(self.types[ti].refs[ri].data_offset);
                let mut len_buf = [0u8; 4];
                read_structural(&self.source, abs, &mut len_buf, "resource data outside container")?;
                let physical = BigEndian::read_u32(&len_buf);

                let r = &mut self.types[ti].refs[ri];
                r.physical_size = physical;
                r.size = physical;

                if r.attrs.contains(ResAttrs::COMPRESSED) {
                    let code = self.types[ti].code;
                    self.resolve_compression(ti, ri, code);
                }
            }
        }
        Ok(())
    }

    /// Probe the payload prefix of one compressed-flagged resource.
    ///
    /// The compressed bit survives only when a valid envelope with
    /// recognized flags is found; in every other case the resource is
    /// downgraded to uncompressed (logical size = physical size) so the
    /// post-load flag always reflects what a reader can act on. An
    /// unrecognized flags value on a matching tag is the one diagnosed
    /// case; tag mismatches and short payloads fall back silently.
    fn resolve_compression(&mut self, ti: usize, ri: usize, code: u32) {
        let r = &self.types[ti].refs[ri];
        let mut prefix = [0u8; ENVELOPE_LEN];
        let got = if r.physical_size as usize >= ENVELOPE_LEN {
            self.read_raw_into(r, 0, &mut prefix).is_ok()
        } else {
            false
        };

        let detection = if got { compress::detect(&prefix) } else { Detection::Absent };
        let r = &mut self.types[ti].refs[ri];
        match detection {
            Detection::Present(env) => {
                r.size = env.uncompressed_size;
                r.decompressor = Some(env.decompressor);
            }
            Detection::UnknownFlags(flags) => {
                log::warn!(
                    "{} {}: unrecognized compression flags {flags:#010x}, treating as uncompressed",
                    TypeCode(code),
                    r.id,
                );
                r.attrs.remove(ResAttrs::COMPRESSED);
            }
            Detection::Absent => {
                r.attrs.remove(ResAttrs::COMPRESSED);
            }
        }
    }

    // ── Index access ─────────────────────────────────────────────────────────

    /// The map-wide attribute word.
    pub fn attributes(&self) -> u16 {
        self.attributes
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// All types, ascending by code.
    pub fn types(&self) -> &[ResType] {
        &self.types
    }

    /// Binary search for one type by code.
    pub fn get(&self, code: u32) -> Option<&ResType> {
        self.types
            .binary_search_by_key(&code, |t| t.code)
            .ok()
            .map(|i| &self.types[i])
    }

    /// Number of resources of `code`; 0 when the type is absent.
    pub fn count(&self, code: u32) -> usize {
        self.get(code).map_or(0, ResType::count)
    }

    // ── Pagination ───────────────────────────────────────────────────────────

    /// A page of type codes plus the count of codes past the page.
    /// `size == 0` means "to the end"; a `start` past the end is an empty
    /// page.
    pub fn type_codes(&self, start: usize, size: usize) -> (Vec<u32>, usize) {
        let (begin, taken, remaining) = page(self.types.len(), start, size);
        let codes = self.types[begin..begin + taken].iter().map(|t| t.code).collect();
        (codes, remaining)
    }

    /// Fill a caller-provided buffer with type codes from `start`.
    /// Returns `(codes written, codes remaining past them)`.
    pub fn type_codes_into(&self, start: usize, out: &mut [u32]) -> Result<(usize, usize)> {
        if out.is_empty() {
            return Err(Error::InvalidArgument("empty output buffer"));
        }
        let (begin, taken, remaining) = page(self.types.len(), start, out.len());
        for (slot, t) in out.iter_mut().zip(&self.types[begin..begin + taken]) {
            *slot = t.code;
        }
        Ok((taken, remaining))
    }

    /// A page of resource attributes for one type, plus the count of
    /// resources past the page. `size == 0` means "to the end".
    pub fn list(&self, code: u32, start: usize, size: usize) -> Result<(Vec<ResAttr<'_>>, usize)> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        let (begin, taken, remaining) = page(t.count(), start, size);
        let attrs = t.refs[begin..begin + taken].iter().map(ResAttr::new).collect();
        Ok((attrs, remaining))
    }

    /// Fill a caller-provided buffer with resource attributes from `start`.
    pub fn list_into<'f>(
        &'f self,
        code: u32,
        start: usize,
        out: &mut [ResAttr<'f>],
    ) -> Result<(usize, usize)> {
        if out.is_empty() {
            return Err(Error::InvalidArgument("empty output buffer"));
        }
        let t = self.get(code).ok_or(Error::NotFound)?;
        let (begin, taken, remaining) = page(t.count(), start, out.len());
        for (slot, r) in out.iter_mut().zip(&t.refs[begin..begin + taken]) {
            *slot = ResAttr::new(r);
        }
        Ok((taken, remaining))
    }

    // ── Attribute lookups ────────────────────────────────────────────────────

    pub fn attr(&self, code: u32, id: i16) -> Result<ResAttr<'_>> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        t.find(id).map(ResAttr::new).ok_or(Error::NotFound)
    }

    pub fn attr_named(&self, code: u32, name: &[u8]) -> Result<ResAttr<'_>> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        t.find_named(name).map(ResAttr::new).ok_or(Error::NotFound)
    }

    // ── Read path ────────────────────────────────────────────────────────────

    /// Read `length` raw bytes of a resource starting `start` bytes into its
    /// payload. `length == 0` reads to the end. A resource whose resolved
    /// compressed flag is still set is refused — handing out compressed
    /// bytes through the raw path would be garbage to most callers.
    pub fn read(&self, code: u32, id: i16, start: u64, length: u64) -> Result<Vec<u8>> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        let r = t.find(id).ok_or(Error::NotFound)?;
        self.read_ref(r, start, length)
    }

    pub fn read_named(&self, code: u32, name: &[u8], start: u64, length: u64) -> Result<Vec<u8>> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        let r = t.find_named(name).ok_or(Error::NotFound)?;
        self.read_ref(r, start, length)
    }

    /// Read by position within a type's ID-sorted list.
    pub fn read_index(&self, code: u32, index: usize, start: u64, length: u64) -> Result<Vec<u8>> {
        let t = self.get(code).ok_or(Error::NotFound)?;
        let r = t.refs.get(index).ok_or(Error::NotFound)?;
        self.read_ref(r, start, length)
    }

    /// Fill a caller-provided buffer from `start` bytes into the payload.
    /// Returns `(bytes read, bytes remaining past them)`.
    pub fn read_into(&self, code: u32, id: i16, start: u64, out: &mut [u8]) -> Result<(usize, usize)> {
        if out.is_empty() {
            return Err(Error::InvalidArgument("empty output buffer"));
        }
        let t = self.get(code).ok_or(Error::NotFound)?;
        let r = t.find(id).ok_or(Error::NotFound)?;
        if r.attrs.contains(ResAttrs::COMPRESSED) {
            return Err(Error::Compressed { decompressor: r.decompressor });
        }
        check_resource_window(r, start, out.len() as u64)?;
        self.read_raw_into(r, start, out)?;
        let end = start + out.len() as u64;
        Ok((out.len(), (u64::from(r.physical_size) - end) as usize))
    }

    fn read_ref(&self, r: &ResourceRef, start: u64, length: u64) -> Result<Vec<u8>> {
        if r.attrs.contains(ResAttrs::COMPRESSED) {
            return Err(Error::Compressed { decompressor: r.decompressor });
        }
        let length = if length == 0 {
            u64::from(r.physical_size)
                .checked_sub(start)
                .ok_or(Error::OutOfBounds {
                    offset: start,
                    len: 0,
                    size: u64::from(r.physical_size),
                })?
        } else {
            length
        };
        check_resource_window(r, start, length)?;
        let mut out = vec![0u8; length as usize];
        self.read_raw_into(r, start, &mut out)?;
        Ok(out)
    }

    /// One physical read of a resource payload window, skipping the 4-byte
    /// stored length word. No compressed-flag policy here; the load pass
    /// uses this to fetch envelope prefixes.
    fn read_raw_into(&self, r: &ResourceRef, start: u64, out: &mut [u8]) -> Result<()> {
        let abs = self.data_offset + u64::from(r.data_offset) + 4 + start;
        self.source.read_at(abs, out)
    }
}

/// Clamp a `(start, size)` page request against `total` items.
/// Returns `(clamped start, items in the page, items after the page)`.
fn page(total: usize, start: usize, size: usize) -> (usize, usize, usize) {
    let begin = start.min(total);
    let available = total - begin;
    let taken = if size == 0 { available } else { size.min(available) };
    (begin, taken, available - taken)
}

/// The requested window must lie within `[0, physical_size]`.
fn check_resource_window(r: &ResourceRef, start: u64, length: u64) -> Result<()> {
    let size = u64::from(r.physical_size);
    match start.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::OutOfBounds { offset: start, len: length, size }),
    }
}

/// Load-time read: a window that falls outside the container is corruption
/// of the fork, not a caller error.
fn read_structural<S: ByteSource>(
    source: &S,
    offset: u64,
    buf: &mut [u8],
    what: &'static str,
) -> Result<()> {
    match source.read_at(offset, buf) {
        Err(Error::OutOfBounds { .. }) => Err(Error::Corrupt(what)),
        other => other,
    }
}
