use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Unknown type, ID, name, or positional index.
    #[error("resource not found")]
    NotFound,
    /// A read window extends past the end of the addressed region.
    #[error("read of {len} bytes at offset {offset} exceeds size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
    /// Malformed header or map. Fatal to the whole load; a container is
    /// never returned partially populated.
    #[error("corrupt resource fork: {0}")]
    Corrupt(&'static str),
    /// Raw read attempted on a resource whose resolved compressed flag is
    /// set. Decompression is an external concern keyed by the reported
    /// decompressor ID.
    #[error("resource is compressed (decompressor {decompressor:?}); raw reads are unsupported")]
    Compressed { decompressor: Option<i16> },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
