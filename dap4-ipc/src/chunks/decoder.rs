use bytes::{Buf, Bytes};
use dap4_dtype::ByteOrder;
use dap4_error::{Dap4Result, dap4_err};

use crate::chunks::{ChunkHeader, HEADER_SIZE};
use crate::decode_dmr_text;

/// The leading chunk of a response: the DMR text and the properties its flags announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    dmr: String,
    order: ByteOrder,
    checksums: bool,
}

impl Preamble {
    /// The DMR text.
    pub fn dmr(&self) -> &str {
        &self.dmr
    }

    /// Take the DMR text.
    pub fn into_dmr(self) -> String {
        self.dmr
    }

    /// The byte order of the data that follows.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Whether the data that follows carries checksums.
    pub fn checksums(&self) -> bool {
        self.checksums
    }
}

/// A chunk decoded from a DAP4 response stream.
#[derive(Debug)]
pub enum DecoderMessage {
    /// The DMR chunk. `last` is set if the response has no data chunks.
    Dmr { preamble: Preamble, last: bool },
    /// The payload of a data chunk. `last` is set on the final chunk.
    Data { payload: Bytes, last: bool },
}

#[derive(Debug)]
pub enum PollRead {
    Some(DecoderMessage),
    /// Returns the _total_ number of bytes needed to make progress.
    /// Note this is _not_ the incremental number of bytes needed to make progress.
    NeedMore(usize),
    /// The last chunk has been decoded.
    Finished,
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Header,
    Payload(ChunkHeader),
    Finished,
    Failed(String),
}

/// A stateful reader for decoding chunks from an arbitrary stream of bytes.
///
/// The first chunk is the DMR, every later chunk is data. The flags of the first chunk fix the
/// byte order and checksum presence for the whole response. An error chunk is read in full and
/// surfaced as a protocol fault carrying the error document, and the decoder keeps failing with
/// the same fault afterwards.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    state: State,
    preamble: Option<(ByteOrder, bool)>,
    chunks: usize,
}

impl ChunkDecoder {
    /// Attempt to read the next chunk from the bytes object.
    ///
    /// If the chunk is incomplete, the function will return `NeedMore` with the _total_ number
    /// of bytes needed to make progress. The next call to read_next _should_ provide at least
    /// this number of bytes otherwise it will be given the same `NeedMore` response.
    pub fn read_next<B: Buf>(&mut self, bytes: &mut B) -> Dap4Result<PollRead> {
        loop {
            match &self.state {
                State::Header => {
                    if bytes.remaining() < HEADER_SIZE {
                        return Ok(PollRead::NeedMore(HEADER_SIZE));
                    }

                    let mut raw = [0u8; HEADER_SIZE];
                    bytes.copy_to_slice(&mut raw);
                    let header = ChunkHeader::decode(raw);
                    log::trace!(
                        "chunk {}: flags {} size {}",
                        self.chunks,
                        header.flags(),
                        header.size()
                    );
                    if header.flags().unknown_bits() != 0 {
                        log::debug!(
                            "chunk {} sets unknown flag bits {:#04x}",
                            self.chunks,
                            header.flags().unknown_bits()
                        );
                    }
                    self.state = State::Payload(header);
                }
                State::Payload(header) => {
                    let header = *header;
                    if bytes.remaining() < header.size() {
                        return Ok(PollRead::NeedMore(header.size()));
                    }

                    let payload = bytes.copy_to_bytes(header.size());
                    self.chunks += 1;
                    let last = header.flags().is_end();

                    if header.flags().is_error() {
                        let document = String::from_utf8_lossy(&payload).into_owned();
                        log::debug!("server sent a {} byte error chunk", payload.len());
                        self.state = State::Failed(document.clone());
                        return Err(dap4_err!(Protocol: "{}", document));
                    }

                    self.state = if last {
                        State::Finished
                    } else {
                        State::Header
                    };

                    if self.preamble.is_none() {
                        let flags = header.flags();
                        let preamble = Preamble {
                            dmr: decode_dmr_text(&payload)?,
                            order: flags.byte_order(),
                            checksums: flags.has_checksums(),
                        };
                        log::debug!(
                            "DMR chunk of {} bytes, data is {}, checksums {}",
                            payload.len(),
                            preamble.order,
                            if preamble.checksums { "on" } else { "off" }
                        );
                        self.preamble = Some((preamble.order, preamble.checksums));
                        return Ok(PollRead::Some(DecoderMessage::Dmr { preamble, last }));
                    }

                    return Ok(PollRead::Some(DecoderMessage::Data { payload, last }));
                }
                State::Finished => return Ok(PollRead::Finished),
                State::Failed(document) => return Err(dap4_err!(Protocol: "{}", document)),
            }
        }
    }

    /// Handle the underlying stream ending with `buffered` undecoded bytes left over.
    ///
    /// Ending cleanly between two chunks after the DMR is accepted as the end of the response
    /// even without an end chunk. Ending anywhere else is a transport fault.
    pub fn finish_at_eof(&mut self, buffered: usize) -> Dap4Result<()> {
        match &self.state {
            State::Finished => Ok(()),
            State::Failed(document) => Err(dap4_err!(Protocol: "{}", document)),
            State::Header if buffered == 0 && self.has_dmr() => {
                log::warn!(
                    "stream ended after {} chunks without an end chunk",
                    self.chunks
                );
                self.state = State::Finished;
                Ok(())
            }
            State::Header if !self.has_dmr() => Err(dap4_err!(
                Transport: "stream ended before the DMR chunk, {} bytes buffered",
                buffered
            )),
            State::Header => Err(dap4_err!(
                Transport: "stream ended inside the header of chunk {}, {} bytes buffered",
                self.chunks,
                buffered
            )),
            State::Payload(header) => Err(dap4_err!(
                Transport: "stream ended inside chunk {}: {} of {} payload bytes read",
                self.chunks,
                buffered,
                header.size()
            )),
        }
    }

    /// Whether the decoder sits between chunks, having consumed nothing of the next one.
    pub fn at_chunk_boundary(&self) -> bool {
        matches!(self.state, State::Header | State::Finished)
    }

    /// Whether the DMR chunk has been decoded.
    pub fn has_dmr(&self) -> bool {
        self.preamble.is_some()
    }

    /// Whether the last chunk has been decoded.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// The number of complete chunks decoded so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// The byte order of the data, once the DMR chunk has been decoded.
    pub fn byte_order(&self) -> Option<ByteOrder> {
        self.preamble.map(|(order, _)| order)
    }

    /// Whether the data carries checksums, once the DMR chunk has been decoded.
    pub fn checksums(&self) -> Option<bool> {
        self.preamble.map(|(_, checksums)| checksums)
    }
}
