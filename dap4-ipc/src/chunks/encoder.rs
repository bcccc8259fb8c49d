use bytes::{Bytes, BytesMut};
use dap4_dtype::ByteOrder;
use dap4_error::{Dap4Result, dap4_bail};

use crate::chunks::{ChunkFlags, ChunkHeader, HEADER_SIZE, MAX_CHUNK_SIZE};

/// A chunk ready to be passed to the encoder.
#[derive(Debug, Clone, Copy)]
pub enum EncoderMessage<'a> {
    /// The DMR text. Set `last` when no data follows.
    Dmr { text: &'a str, last: bool },
    /// Serialized data, split over as many chunks as needed. Set `last` on the final write.
    Data { payload: &'a Bytes, last: bool },
    /// An error document. This ends the response.
    Error(&'a str),
    /// An empty final chunk.
    End,
}

/// Encodes chunks in the DAP4 wire format.
///
/// Every chunk carries the byte order and checksum flags the encoder was configured with.
#[derive(Debug, Clone)]
pub struct ChunkEncoder {
    order: ByteOrder,
    checksums: bool,
    max_chunk_size: usize,
}

impl Default for ChunkEncoder {
    fn default() -> Self {
        Self {
            order: ByteOrder::default(),
            checksums: true,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl ChunkEncoder {
    /// Announce the byte order of the data.
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    /// Announce whether the data carries checksums.
    pub fn with_checksums(mut self, checksums: bool) -> Self {
        self.checksums = checksums;
        self
    }

    /// Split data into chunks of at most `size` bytes, clamped to `1..=MAX_CHUNK_SIZE`.
    ///
    /// The DMR is always a single chunk and only bound by [`MAX_CHUNK_SIZE`].
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// The byte order announced.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Encode a message for writing to a byte stream.
    ///
    /// The returned buffers should be written contiguously to the stream.
    pub fn encode(&self, message: EncoderMessage) -> Dap4Result<Vec<Bytes>> {
        match message {
            EncoderMessage::Dmr { text, last } => {
                if text.len() > MAX_CHUNK_SIZE {
                    dap4_bail!(
                        "DMR of {} bytes does not fit in one chunk of at most {}",
                        text.len(),
                        MAX_CHUNK_SIZE
                    );
                }
                let flags = self.flags(last, false);
                Ok(self.chunk(flags, Bytes::copy_from_slice(text.as_bytes()))?.to_vec())
            }
            EncoderMessage::Data { payload, last } => {
                let mut buffers = Vec::new();
                let mut offset = 0;
                while offset < payload.len() {
                    let end = (offset + self.max_chunk_size).min(payload.len());
                    let flags = self.flags(last && end == payload.len(), false);
                    buffers.extend(self.chunk(flags, payload.slice(offset..end))?);
                    offset = end;
                }
                if payload.is_empty() && last {
                    buffers.extend(self.chunk(self.flags(true, false), Bytes::new())?);
                }
                Ok(buffers)
            }
            EncoderMessage::Error(document) => {
                let mut payload = Bytes::copy_from_slice(document.as_bytes());
                if payload.len() > self.max_chunk_size {
                    log::warn!(
                        "truncating {} byte error document to {} bytes",
                        payload.len(),
                        self.max_chunk_size
                    );
                    payload.truncate(self.max_chunk_size);
                }
                Ok(self.chunk(self.flags(true, true), payload)?.to_vec())
            }
            EncoderMessage::End => Ok(self.chunk(self.flags(true, false), Bytes::new())?.to_vec()),
        }
    }

    fn flags(&self, last: bool, error: bool) -> ChunkFlags {
        ChunkFlags::DATA
            .with(ChunkFlags::END, last)
            .with(ChunkFlags::ERROR, error)
            .with(ChunkFlags::LITTLE_ENDIAN, self.order.is_little_endian())
            .with(ChunkFlags::NOCHECKSUM, !self.checksums)
    }

    fn chunk(&self, flags: ChunkFlags, payload: Bytes) -> Dap4Result<[Bytes; 2]> {
        let header = ChunkHeader::try_new(flags, payload.len())?;
        let mut raw = BytesMut::with_capacity(HEADER_SIZE);
        header.encode(&mut raw);
        Ok([raw.freeze(), payload])
    }
}
