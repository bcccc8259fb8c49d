use std::io;

use bytes::{Bytes, BytesMut};
use dap4_buffer::DataBuffer;
use dap4_error::{Dap4Expect, Dap4Result, dap4_bail};
use futures_util::stream::try_unfold;
use futures_util::{AsyncRead, AsyncReadExt, Stream};

use crate::chunks::{ChunkDecoder, Dap4Response, DecoderMessage, PollRead, Preamble, concat_payloads};

/// A DAP4 chunk reader backed by an `AsyncRead` stream.
///
/// Chunk reads are strictly ordered. Dropping the reader abandons the response.
pub struct AsyncChunkReader<R> {
    read: R,
    buffer: BytesMut,
    decoder: ChunkDecoder,
    preamble: Option<Preamble>,
    done: bool,
}

impl<R: AsyncRead + Unpin> AsyncChunkReader<R> {
    pub fn new(read: R) -> Self {
        Self {
            read,
            buffer: BytesMut::new(),
            decoder: ChunkDecoder::default(),
            preamble: None,
            done: false,
        }
    }

    /// Read the DMR chunk, if it has not been read yet.
    pub async fn read_dmr(&mut self) -> Dap4Result<&Preamble> {
        if self.preamble.is_none() {
            match self.poll().await? {
                Some(DecoderMessage::Dmr { preamble, last }) => {
                    self.done = last;
                    self.preamble = Some(preamble);
                }
                Some(DecoderMessage::Data { .. }) | None => {
                    dap4_bail!(Transport: "response did not start with a DMR chunk")
                }
            }
        }
        Ok(self.preamble.as_ref().dap4_expect("DMR chunk was just read"))
    }

    /// The payload of the next non-empty data chunk, or `None` after the last one.
    pub async fn next_payload(&mut self) -> Dap4Result<Option<Bytes>> {
        self.read_dmr().await?;
        while !self.done {
            match self.poll().await? {
                Some(DecoderMessage::Data { payload, last }) => {
                    self.done = last;
                    if !payload.is_empty() {
                        return Ok(Some(payload));
                    }
                }
                Some(DecoderMessage::Dmr { .. }) => {
                    dap4_bail!(Transport: "unexpected second DMR chunk")
                }
                None => self.done = true,
            }
        }
        Ok(None)
    }

    /// Read every remaining data chunk into one buffer, tagged with the announced byte order.
    pub async fn read_data(&mut self) -> Dap4Result<DataBuffer> {
        let order = self.read_dmr().await?.order();
        let mut payloads = Vec::new();
        while let Some(payload) = self.next_payload().await? {
            payloads.push(payload);
        }
        let chunks = payloads.len();
        let data = concat_payloads(payloads);
        log::debug!("read {} data bytes from {} chunks", data.len(), chunks);
        Ok(DataBuffer::new(data, order))
    }

    /// Read the whole response.
    pub async fn read_response(mut self) -> Dap4Result<Dap4Response> {
        let data = self.read_data().await?;
        let preamble = self.preamble.take().dap4_expect("DMR chunk was read with the data");
        let checksums = preamble.checksums();
        Ok(Dap4Response::new(preamble.into_dmr(), data, checksums))
    }

    /// The data chunk payloads as a stream.
    pub fn into_payload_stream(self) -> impl Stream<Item = Dap4Result<Bytes>> {
        try_unfold(self, |mut reader| async move {
            Ok(reader
                .next_payload()
                .await?
                .map(|payload| (payload, reader)))
        })
    }

    /// The DMR chunk, if it has been read.
    pub fn preamble(&self) -> Option<&Preamble> {
        self.preamble.as_ref()
    }

    pub fn into_inner(self) -> R {
        self.read
    }

    async fn poll(&mut self) -> Dap4Result<Option<DecoderMessage>> {
        loop {
            match self.decoder.read_next(&mut self.buffer)? {
                PollRead::Some(message) => return Ok(Some(message)),
                PollRead::Finished => return Ok(None),
                PollRead::NeedMore(total) => {
                    if !self.fill(total).await? {
                        self.decoder.finish_at_eof(self.buffer.len())?;
                        return Ok(None);
                    }
                }
            }
        }
    }

    async fn fill(&mut self, total: usize) -> Dap4Result<bool> {
        while self.buffer.len() < total {
            let start = self.buffer.len();
            self.buffer.resize(total, 0);
            match self.read.read(&mut self.buffer[start..]).await {
                Ok(0) => {
                    self.buffer.truncate(start);
                    return Ok(false);
                }
                Ok(n) => self.buffer.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.buffer.truncate(start),
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(e.into());
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use dap4_dtype::ByteOrder;
    use dap4_error::ErrorCategory;
    use futures_util::TryStreamExt;

    use super::*;
    use crate::chunks::{AsyncChunkWriter, ChunkEncoder};

    async fn response(data: &[u8]) -> Vec<u8> {
        let encoder = ChunkEncoder::default()
            .with_order(ByteOrder::LittleEndian)
            .with_checksums(false)
            .with_max_chunk_size(4);
        let mut writer = AsyncChunkWriter::with_encoder(Vec::new(), encoder);
        writer.write_dmr("<Dataset/>").await.unwrap();
        writer
            .write_data(Bytes::copy_from_slice(data))
            .await
            .unwrap();
        writer.finish().await.unwrap()
    }

    #[tokio::test]
    async fn reads_whole_response() {
        let bytes = response(&[1, 2, 3, 4, 5, 6]).await;
        let response = AsyncChunkReader::new(bytes.as_slice())
            .read_response()
            .await
            .unwrap();
        assert_eq!(response.dmr(), "<Dataset/>");
        assert_eq!(response.order(), ByteOrder::LittleEndian);
        assert!(!response.checksums());
        assert_eq!(response.data().as_slice(), &[1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn payload_stream() {
        let bytes = response(&[1, 2, 3, 4, 5, 6]).await;
        let payloads: Vec<Bytes> = AsyncChunkReader::new(bytes.as_slice())
            .into_payload_stream()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1].as_ref(), &[5, 6]);
    }

    #[tokio::test]
    async fn error_chunk() {
        let mut writer = AsyncChunkWriter::new(Vec::new());
        writer.write_dmr("<Dataset/>").await.unwrap();
        writer.write_error("<Error>x</Error>").await.unwrap();
        let bytes = writer.into_inner();

        let err = AsyncChunkReader::new(bytes.as_slice())
            .read_data()
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Protocol);
        assert_eq!(err.protocol_document(), Some("<Error>x</Error>"));
    }

    #[tokio::test]
    async fn truncated() {
        let bytes = response(&[1, 2, 3, 4, 5, 6]).await;
        let err = AsyncChunkReader::new(&bytes[..bytes.len() - 3])
            .read_data()
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Transport);
    }
}
