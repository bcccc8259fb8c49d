use std::io::Read;

use dap4_buffer::DataBuffer;
use dap4_compiler::{CompileOptions, CompiledData, DataCompiler};
use dap4_dmr::Dataset;
use dap4_error::Dap4Result;
use dap4_ipc::chunks::{AsyncChunkReader, Dap4Response, SyncChunkReader};
use dap4_ipc::{read_dmr_only, read_dmr_only_async};
use futures_util::AsyncRead;

/// Builds a metadata tree from DMR text.
///
/// Parsing DMR text is left to the caller. Any `Fn(&str) -> Dap4Result<Dataset>` is a parser.
pub trait DmrParser {
    fn parse(&self, dmr: &str) -> Dap4Result<Dataset>;
}

impl<F> DmrParser for F
where
    F: Fn(&str) -> Dap4Result<Dataset>,
{
    fn parse(&self, dmr: &str) -> Dap4Result<Dataset> {
        self(dmr)
    }
}

/// Reads DAP4 responses, parsing their DMR with `P`.
#[derive(Debug, Clone)]
pub struct Dap4Reader<P> {
    parser: P,
    options: CompileOptions,
}

impl<P: DmrParser> Dap4Reader<P> {
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            options: CompileOptions::default(),
        }
    }

    /// Set the options data is compiled with.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Read a whole chunked data response.
    pub fn read<R: Read>(&self, read: R) -> Dap4Result<Dap4Data> {
        let response = SyncChunkReader::new(read).read_response()?;
        self.prepare(response)
    }

    /// Read a whole chunked data response from an async stream.
    pub async fn read_async<R: AsyncRead + Unpin>(&self, read: R) -> Dap4Result<Dap4Data> {
        let response = AsyncChunkReader::new(read).read_response().await?;
        self.prepare(response)
    }

    /// Read a metadata-only response, which is unframed DMR text.
    pub fn read_dmr<R: Read>(&self, read: R) -> Dap4Result<Dataset> {
        self.parser.parse(&read_dmr_only(read)?)
    }

    /// Read a metadata-only response from an async stream.
    pub async fn read_dmr_async<R: AsyncRead + Unpin>(&self, read: R) -> Dap4Result<Dataset> {
        self.parser.parse(&read_dmr_only_async(read).await?)
    }

    fn prepare(&self, response: Dap4Response) -> Dap4Result<Dap4Data> {
        let checksums = response.checksums();
        let (dmr, buffer) = response.into_parts();
        let dataset = self.parser.parse(&dmr)?;
        log::debug!(
            "read {} data bytes for dataset {}, {} byte order",
            buffer.len(),
            dataset.name(),
            buffer.order()
        );
        Ok(Dap4Data {
            dmr,
            dataset,
            buffer,
            options: self.options.clone().with_stream_checksums(checksums),
        })
    }
}

/// A data response that has been read but not yet compiled.
///
/// Owns the metadata tree and the data buffer. [`Dap4Data::compile`] borrows both, so compiled
/// cursors can never outlive them.
#[derive(Debug, Clone)]
pub struct Dap4Data {
    dmr: String,
    dataset: Dataset,
    buffer: DataBuffer,
    options: CompileOptions,
}

impl Dap4Data {
    /// The DMR text as received.
    pub fn dmr(&self) -> &str {
        &self.dmr
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    /// The compile options, with checksums switched off if the response suppressed them.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn compile(&self) -> Dap4Result<CompiledData<'_>> {
        DataCompiler::new(&self.dataset, self.options.clone()).compile(self.buffer.clone())
    }
}
