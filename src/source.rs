//! Byte-source backends — the random-offset read capability every other
//! module is built on.
//!
//! Three backends cover the supported container locations:
//!   - [`MemSource`]: an in-memory buffer, borrowed from the caller or
//!     owned/copied at construction.
//!   - [`StreamSource`]: anything `Read + Seek` (an open [`File`] in the
//!     common case). The stream's single shared cursor is serialized behind
//!     a mutex so concurrent `&self` reads stay correct.
//!   - Any caller type implementing [`ByteSource`] directly, plugged in via
//!     `ResourceFork::open_source`.
//!
//! Every read is one synchronous call against the backend; there is no
//! buffering or caching layer here. Callers that want caching add it above
//! this abstraction.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Random-offset reads over some byte container.
pub trait ByteSource {
    /// Fill `buf` with the bytes at `offset`.
    ///
    /// Fails with [`Error::OutOfBounds`] (and fills nothing) when
    /// `offset + buf.len()` exceeds [`len`](ByteSource::len).
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Total length of the container in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reject windows that extend past `size` before touching the backend.
pub(crate) fn check_window(offset: u64, len: u64, size: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::OutOfBounds { offset, len, size }),
    }
}

// ── MemSource ────────────────────────────────────────────────────────────────

/// In-memory backend over borrowed or owned bytes.
pub struct MemSource<'a> {
    buf: Cow<'a, [u8]>,
}

impl<'a> MemSource<'a> {
    /// Borrow `buf` for the life of the source. No copy is made.
    pub fn borrowed(buf: &'a [u8]) -> Self {
        Self { buf: Cow::Borrowed(buf) }
    }

    /// Copy `buf` into a source that owns its bytes.
    pub fn copied(buf: &[u8]) -> MemSource<'static> {
        MemSource { buf: Cow::Owned(buf.to_vec()) }
    }

    /// Take ownership of `buf`.
    pub fn owned(buf: Vec<u8>) -> MemSource<'static> {
        MemSource { buf: Cow::Owned(buf) }
    }
}

impl<'a> ByteSource for MemSource<'a> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_window(offset, buf.len() as u64, self.len())?;
        let start = offset as usize;
        buf.copy_from_slice(&self.buf[start..start + buf.len()]);
        Ok(())
    }

    fn len(&self) -> u64 {
        self.buf.len() as u64
    }
}

// ── StreamSource ─────────────────────────────────────────────────────────────

/// Backend over any `Read + Seek` stream.
///
/// The total length is captured once at construction by seeking to the end.
/// The stream has one shared cursor, so every read re-seeks and runs under
/// an internal lock; independent absolute-offset reads through `&self` never
/// observe each other's cursor.
pub struct StreamSource<R> {
    inner: Mutex<R>,
    len: u64,
}

impl StreamSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> StreamSource<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner: Mutex::new(inner), len })
    }
}

impl<R: Read + Seek> ByteSource for StreamSource<R> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_window(offset, buf.len() as u64, self.len)?;
        // A poisoned lock only means another reader panicked mid-read; the
        // cursor is re-seeked on every read, so the state is still usable.
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.seek(SeekFrom::Start(offset))?;
        inner.read_exact(buf)?;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.len
    }
}
