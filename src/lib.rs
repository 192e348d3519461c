pub mod compress;
pub mod error;
pub mod fork;
pub mod header;
pub mod index;
pub mod map;
pub mod source;

pub use compress::{Envelope, COMPRESSED_TAG};
pub use error::{Error, Result};
pub use fork::{ResAttr, ResourceFork};
pub use index::{ResAttrs, ResType, ResourceRef, TypeCode};
pub use source::{ByteSource, MemSource, StreamSource};
