//! DAP4 chunked transport framing.
//!
//! A DAP4 data response is a sequence of chunks. Each chunk is a 4-byte header followed by a
//! payload: the first header byte holds the chunk flags, the remaining three hold the payload
//! size as a big-endian 24-bit integer. The first chunk carries the DMR text, the following
//! chunks carry the serialized data. A chunk flagged as an error carries an error document
//! instead, and a chunk flagged as the end is the last one in the stream.
//!
//! This crate provides a [`ChunkDecoder`](chunks::ChunkDecoder) state machine, readers that drive
//! it over any `Read` or `AsyncRead` stream, and encoders and writers that produce the format.

pub mod chunks;
mod mode;

pub use mode::*;
