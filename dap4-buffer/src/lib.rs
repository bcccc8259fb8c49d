#![deny(missing_docs)]

//! Byte buffers for DAP4 data responses.
//!
//! A [`DataBuffer`] holds the concatenated data chunks of one response together with the byte
//! order announced by the server. It is reference counted and never copied: every cursor over a
//! compiled response shares it. A [`BufferCursor`] is an explicit read position over a buffer
//! that only moves forward.

pub use buffer::*;
pub use checksum::*;
pub use cursor::*;
pub use writer::*;

mod buffer;
mod checksum;
mod cursor;
mod writer;

/// The width of the count and length prefixes in a data response.
pub const COUNT_SIZE: usize = 8;
