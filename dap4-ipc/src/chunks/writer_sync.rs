use std::io::Write;

use bytes::Bytes;
use dap4_error::Dap4Result;

use crate::chunks::{ChunkEncoder, EncoderMessage};

/// Writes a chunked DAP4 response to a `Write` stream.
///
/// Write the DMR first, then any number of data buffers, then [`finish`](Self::finish) to
/// emit the end chunk. An error document can be written at any point after the DMR and ends
/// the response.
pub struct SyncChunkWriter<W> {
    write: W,
    encoder: ChunkEncoder,
}

impl<W: Write> SyncChunkWriter<W> {
    pub fn new(write: W) -> Self {
        Self::with_encoder(write, ChunkEncoder::default())
    }

    pub fn with_encoder(write: W, encoder: ChunkEncoder) -> Self {
        Self { write, encoder }
    }

    pub fn write_message(&mut self, message: EncoderMessage) -> Dap4Result<()> {
        for buffer in self.encoder.encode(message)? {
            self.write.write_all(&buffer)?;
        }
        Ok(())
    }

    /// Write the DMR chunk.
    pub fn write_dmr(&mut self, text: &str) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Dmr { text, last: false })
    }

    /// Write data, split over as many chunks as needed.
    pub fn write_data(&mut self, payload: Bytes) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Data {
            payload: &payload,
            last: false,
        })
    }

    /// Write an error chunk.
    pub fn write_error(&mut self, document: &str) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Error(document))
    }

    /// Write the end chunk and flush, returning the underlying stream.
    pub fn finish(mut self) -> Dap4Result<W> {
        self.write_message(EncoderMessage::End)?;
        self.write.flush()?;
        Ok(self.write)
    }

    pub fn inner(&self) -> &W {
        &self.write
    }

    pub fn into_inner(self) -> W {
        self.write
    }
}
