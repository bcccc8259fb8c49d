use std::io;
use std::io::Read;

use bytes::{Buf, Bytes, BytesMut};
use dap4_buffer::DataBuffer;
use dap4_error::{Dap4Expect, Dap4Result, dap4_bail};

use crate::chunks::{ChunkDecoder, Dap4Response, DecoderMessage, PollRead, Preamble, concat_payloads};

/// A DAP4 chunk reader backed by a `Read` stream.
///
/// The reader pulls exactly the bytes the decoder asks for, so nothing past the end chunk is
/// consumed from the stream. Besides whole-response helpers it implements `Read` over the
/// concatenated data payloads.
pub struct SyncChunkReader<R> {
    read: R,
    buffer: BytesMut,
    decoder: ChunkDecoder,
    preamble: Option<Preamble>,
    pending: Bytes,
    done: bool,
}

impl<R: Read> SyncChunkReader<R> {
    pub fn new(read: R) -> Self {
        Self {
            read,
            buffer: BytesMut::new(),
            decoder: ChunkDecoder::default(),
            preamble: None,
            pending: Bytes::new(),
            done: false,
        }
    }

    /// Read the DMR chunk, if it has not been read yet.
    pub fn read_dmr(&mut self) -> Dap4Result<&Preamble> {
        if self.preamble.is_none() {
            match self.poll()? {
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
    pub fn next_payload(&mut self) -> Dap4Result<Option<Bytes>> {
        self.read_dmr()?;
        if !self.pending.is_empty() {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        while !self.done {
            match self.poll()? {
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
    pub fn read_data(&mut self) -> Dap4Result<DataBuffer> {
        let order = self.read_dmr()?.order();
        let mut payloads = Vec::new();
        while let Some(payload) = self.next_payload()? {
            payloads.push(payload);
        }
        let chunks = payloads.len();
        let data = concat_payloads(payloads);
        log::debug!("read {} data bytes from {} chunks", data.len(), chunks);
        Ok(DataBuffer::new(data, order))
    }

    /// Read the whole response.
    pub fn read_response(mut self) -> Dap4Result<Dap4Response> {
        let data = self.read_data()?;
        let preamble = self.preamble.take().dap4_expect("DMR chunk was read with the data");
        let checksums = preamble.checksums();
        Ok(Dap4Response::new(preamble.into_dmr(), data, checksums))
    }

    /// The DMR chunk, if it has been read.
    pub fn preamble(&self) -> Option<&Preamble> {
        self.preamble.as_ref()
    }

    /// Whether the last chunk has been read.
    pub fn is_done(&self) -> bool {
        self.done && self.pending.is_empty()
    }

    pub fn into_inner(self) -> R {
        self.read
    }

    fn poll(&mut self) -> Dap4Result<Option<DecoderMessage>> {
        loop {
            match self.decoder.read_next(&mut self.buffer)? {
                PollRead::Some(message) => return Ok(Some(message)),
                PollRead::Finished => return Ok(None),
                PollRead::NeedMore(total) => {
                    if !self.fill(total)? {
                        self.decoder.finish_at_eof(self.buffer.len())?;
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Read until `total` bytes are buffered. Returns false if the stream ends first.
    fn fill(&mut self, total: usize) -> Dap4Result<bool> {
        while self.buffer.len() < total {
            let start = self.buffer.len();
            self.buffer.resize(total, 0);
            match self.read.read(&mut self.buffer[start..]) {
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

impl<R: Read> Read for SyncChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.next_payload()? {
                Some(payload) => self.pending = payload,
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}
