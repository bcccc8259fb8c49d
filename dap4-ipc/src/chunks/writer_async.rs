use bytes::Bytes;
use dap4_error::Dap4Result;
use futures_util::{AsyncWrite, AsyncWriteExt};

use crate::chunks::{ChunkEncoder, EncoderMessage};

/// Writes a chunked DAP4 response to an `AsyncWrite` stream.
pub struct AsyncChunkWriter<W> {
    write: W,
    encoder: ChunkEncoder,
}

impl<W: AsyncWrite + Unpin> AsyncChunkWriter<W> {
    pub fn new(write: W) -> Self {
        Self::with_encoder(write, ChunkEncoder::default())
    }

    pub fn with_encoder(write: W, encoder: ChunkEncoder) -> Self {
        Self { write, encoder }
    }

    pub async fn write_message(&mut self, message: EncoderMessage<'_>) -> Dap4Result<()> {
        for buffer in self.encoder.encode(message)? {
            self.write.write_all(&buffer).await?;
        }
        Ok(())
    }

    pub async fn write_dmr(&mut self, text: &str) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Dmr { text, last: false })
            .await
    }

    pub async fn write_data(&mut self, payload: Bytes) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Data {
            payload: &payload,
            last: false,
        })
        .await
    }

    pub async fn write_error(&mut self, document: &str) -> Dap4Result<()> {
        self.write_message(EncoderMessage::Error(document)).await
    }

    /// Write the end chunk and flush, returning the underlying stream.
    pub async fn finish(mut self) -> Dap4Result<W> {
        self.write_message(EncoderMessage::End).await?;
        self.write.flush().await?;
        Ok(self.write)
    }

    pub fn inner(&self) -> &W {
        &self.write
    }

    pub fn into_inner(self) -> W {
        self.write
    }
}
